//! End-to-end pipeline tests over a temporary asset tree.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use tempfile::TempDir;

use super::Pipeline;
use super::target::concat_digest;
use crate::asset::{AssetKind, FileDescriptor};
use crate::cache::{MemoryCache, MetadataCache};
use crate::compile::{TransformReport, TransformRequest, Transformer};
use crate::config::{AssetsConfig, test_parse_config};
use crate::library::{Fetcher, Libraries, LibraryPlugin};

// ============================================================================
// Fixtures
// ============================================================================

/// Copies the source verbatim (or fails), counting invocations.
#[derive(Default)]
struct MockTransformer {
    fail: bool,
    calls: AtomicUsize,
    spawns: AtomicUsize,
}

impl MockTransformer {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn spawns(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }
}

impl Transformer for MockTransformer {
    fn transform(&self, request: &TransformRequest) -> Result<TransformReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Ok(TransformReport::failed("mock failure"));
        }
        fs::copy(&request.source, &request.destination)?;
        Ok(TransformReport::ok())
    }

    fn spawn(&self, _request: TransformRequest) -> Result<()> {
        // the job never finishes on its own
        self.spawns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Claims `lib/` and answers with remote-only descriptors.
struct Vendor;

impl LibraryPlugin for Vendor {
    fn id(&self) -> &str {
        "vendor"
    }

    fn claims(&self, name: &str) -> bool {
        name.starts_with("lib/")
    }

    fn file_data(&self, name: &str) -> Option<FileDescriptor> {
        Some(
            FileDescriptor::library(name, "vendor", "1")
                .with_url(format!("https://vendor.example.com/{name}")),
        )
    }

    fn signature(&self, _descriptor: &FileDescriptor) -> Option<String> {
        Some("1".into())
    }
}

/// Serves one fixed body and counts downloads.
struct StaticFetcher {
    body: &'static str,
    calls: AtomicUsize,
}

impl StaticFetcher {
    fn new(body: &'static str) -> Self {
        Self {
            body,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Fetcher for StaticFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.as_bytes().to_vec())
    }
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, content: &str) {
        let path = self.root().join("assets").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(&self, toml: &str) -> AssetsConfig {
        test_parse_config(self.root(), toml)
    }

    fn output(&self) -> std::path::PathBuf {
        self.config("").paths.output
    }

    /// `a.css` plus `b.css` requiring it.
    fn with_css_pair(self) -> Self {
        self.write("a.css", "a { color: red; }\n");
        self.write("b.css", "/*\n * @requires a.css\n */\nb { color: blue; }\n");
        self
    }
}

fn pipeline(
    kind: AssetKind,
    config: AssetsConfig,
    cache: Arc<dyn MetadataCache>,
    transformer: Arc<dyn Transformer>,
) -> Pipeline {
    Pipeline::builder(kind, config)
        .cache(cache)
        .libraries(Libraries::new())
        .transformer(transformer)
        .build()
        .unwrap()
}

fn css(fixture: &Fixture, toml: &str) -> (Pipeline, Arc<MockTransformer>) {
    let transformer = Arc::new(MockTransformer::default());
    let p = pipeline(
        AssetKind::Css,
        fixture.config(toml),
        Arc::new(MemoryCache::new()),
        transformer.clone(),
    );
    (p, transformer)
}

fn names(list: &[FileDescriptor]) -> Vec<&str> {
    list.iter().map(FileDescriptor::name).collect()
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Resolver
// ============================================================================

#[test]
fn test_dependency_comes_first() {
    let fixture = Fixture::new().with_css_pair();
    let (p, _) = css(&fixture, "");

    let list = p.resolve(&strings(&["a.css", "b.css"]));
    assert_eq!(names(&list), vec!["a.css", "b.css"]);
}

#[test]
fn test_dependency_pulled_in_when_not_queued() {
    let fixture = Fixture::new().with_css_pair();
    let (p, _) = css(&fixture, "");

    let list = p.resolve(&strings(&["b.css"]));
    assert_eq!(names(&list), vec!["a.css", "b.css"]);
}

#[test]
fn test_name_requested_twice_emitted_once() {
    let fixture = Fixture::new().with_css_pair();
    let (p, _) = css(&fixture, "");

    let list = p.resolve(&strings(&["b.css", "b.css"]));
    assert_eq!(names(&list), vec!["a.css", "b.css"]);
}

#[test]
fn test_sibling_order_and_transitive_dependencies() {
    let fixture = Fixture::new();
    fixture.write("base.js", "var base;\n");
    fixture.write("util.js", "// @requires base.js\nvar util;\n");
    fixture.write("app.js", "// @requires util.js, widgets.js\nvar app;\n");
    fixture.write("widgets.js", "// @requires base.js\nvar widgets;\n");
    let p = pipeline(
        AssetKind::Js,
        fixture.config(""),
        Arc::new(MemoryCache::new()),
        Arc::new(MockTransformer::default()),
    );

    let list = p.resolve(&strings(&["app.js"]));
    assert_eq!(names(&list), vec!["base.js", "util.js", "widgets.js", "app.js"]);
}

#[test]
fn test_cycle_is_cut() {
    let fixture = Fixture::new();
    fixture.write("a.js", "// @requires b.js\n");
    fixture.write("b.js", "// @requires a.js\n");
    let p = pipeline(
        AssetKind::Js,
        fixture.config(""),
        Arc::new(MemoryCache::new()),
        Arc::new(MockTransformer::default()),
    );

    let list = p.resolve(&strings(&["a.js"]));
    assert_eq!(names(&list), vec!["b.js", "a.js"]);
}

#[test]
fn test_missing_dependency_skipped() {
    let fixture = Fixture::new();
    fixture.write("a.css", "/* @requires gone.css */\na{}\n");
    let (p, _) = css(&fixture, "");

    let list = p.resolve(&strings(&["a.css", "missing.css"]));
    assert_eq!(names(&list), vec!["a.css"]);
}

#[test]
fn test_provided_alias_not_emitted_again() {
    let fixture = Fixture::new();
    fixture.write("theme.css", "/* @provides legacy.css */\nt{}\n");
    fixture.write("legacy.css", "l{}\n");
    let (p, _) = css(&fixture, "");

    let list = p.resolve(&strings(&["theme.css", "legacy.css"]));
    assert_eq!(names(&list), vec!["theme.css"]);
    assert!(p.emitted().contains("legacy.css"));
}

#[test]
fn test_claimed_name_skips_filesystem() {
    let fixture = Fixture::new();
    // a plain file at the same name must not win
    fixture.write("lib/x", "not me\n");
    let mut libraries = Libraries::new();
    libraries.register(Vendor);
    let p = Pipeline::builder(AssetKind::Js, fixture.config(""))
        .cache(Arc::new(MemoryCache::new()))
        .libraries(libraries)
        .transformer(Arc::new(MockTransformer::default()))
        .build()
        .unwrap();

    assert!(p.add("lib/x", None));
    let list = p.resolve(&strings(&["lib/x"]));
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].library.as_deref(), Some("vendor"));
    assert!(list[0].path().is_none());
    assert_eq!(p.url_for(&list[0]), "https://vendor.example.com/lib/x");
}

#[test]
fn test_add_drops_unknown_and_foreign_names() {
    let fixture = Fixture::new().with_css_pair();
    fixture.write("app.js", "var a;\n");
    let (p, _) = css(&fixture, "");

    assert!(p.add("./a.css", None));
    assert!(!p.add("missing.css", None));
    assert!(!p.add("app.js", None));
}

// ============================================================================
// Generate (Scenarios C, D and markup)
// ============================================================================

#[test]
fn test_concatenation_disabled_keeps_files_apart() {
    let fixture = Fixture::new().with_css_pair();
    let (p, _) = css(&fixture, "[build]\nconcatenate = false\n");

    assert!(p.add("a.css", None));
    assert!(p.add("b.css", None));
    let urls = p.generate(None);
    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|u| u.starts_with("/_assets/")));
}

#[test]
fn test_concatenation_yields_one_merged_artifact() {
    let fixture = Fixture::new().with_css_pair();
    let (p, transformer) = css(&fixture, "");

    assert!(p.add("a.css", None));
    assert!(p.add("b.css", None));
    let urls = p.generate(None);
    assert_eq!(transformer.calls(), 2);

    // expected name from the compiled pair, computed by an independent pipeline
    let (other, _) = css(&fixture, "");
    let compiled = other.compile(other.resolve(&strings(&["a.css", "b.css"])));
    assert!(compiled.iter().all(|d| !d.is_resource));
    let expected = format!("/_assets/{}.css", concat_digest(&compiled));
    assert_eq!(urls, vec![expected]);

    let merged_name = urls[0].trim_start_matches("/_assets/");
    let merged = fs::read_to_string(fixture.output().join(merged_name)).unwrap();
    let a_at = merged.find("/* a.css */").unwrap();
    let b_at = merged.find("/* b.css */").unwrap();
    assert!(a_at < b_at);
    assert!(merged.contains("color: red") && merged.contains("color: blue"));
}

#[test]
fn test_merge_without_separator() {
    let fixture = Fixture::new().with_css_pair();
    let (p, _) = css(&fixture, "[build]\nseparator = false\n");

    p.add("b.css", None);
    let urls = p.generate(None);
    assert_eq!(urls.len(), 1);
    let merged_name = urls[0].trim_start_matches("/_assets/");
    let merged = fs::read_to_string(fixture.output().join(merged_name)).unwrap();
    assert!(!merged.contains("/* a.css */"));
    assert!(merged.starts_with("a { color: red; }"));
}

#[test]
fn test_plugin_entries_extracted_before_merge() {
    let fixture = Fixture::new();
    fixture.write("a.js", "var a;\n");
    fixture.write("b.js", "// @requires lib/jquery.js\nvar b;\n");
    let config = fixture.config(
        r#"
[[library]]
kind = "cdn"
prefix = "lib/"
base_url = "https://cdn.example.com/npm"
version = "1"

[library.packages."lib/jquery.js"]
path = "jquery@3.7.1/dist/jquery.js"
"#,
    );
    let p = Pipeline::builder(AssetKind::Js, config.clone())
        .cache(Arc::new(MemoryCache::new()))
        .libraries(Libraries::from_config(&config))
        .transformer(Arc::new(MockTransformer::default()))
        .build()
        .unwrap();

    p.add("a.js", None);
    p.add("b.js", None);
    let urls = p.generate(None);
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0], "https://cdn.example.com/npm/jquery@3.7.1/dist/jquery.min.js");
    assert!(urls[1].starts_with("/_assets/") && urls[1].ends_with(".js"));
}

#[test]
fn test_output_list_spans_generate_calls() {
    let fixture = Fixture::new().with_css_pair();
    let (p, _) = css(&fixture, "[build]\nconcatenate = false\n");

    p.add("a.css", None);
    assert_eq!(p.generate(None).len(), 1);

    p.add("a.css", None);
    p.add("b.css", None);
    assert_eq!(p.generate(None).len(), 1);
    assert!(p.generate(None).is_empty());
}

#[test]
fn test_queues_are_independent() {
    let fixture = Fixture::new().with_css_pair();
    let (p, _) = css(&fixture, "[build]\nconcatenate = false\n");

    p.add("a.css", Some("head"));
    assert!(p.generate(None).is_empty());
    assert_eq!(p.generate(Some("head")).len(), 1);
}

#[test]
fn test_render_tags_by_queue() {
    let fixture = Fixture::new().with_css_pair();
    let (p, _) = css(&fixture, "[build]\nconcatenate = false\n");

    p.add("b.css", Some("head"));
    let tags = p.render(Some("head"), &[("media", "screen")]);
    assert_eq!(tags.len(), 2);
    assert!(tags[0].contains(r#"id="head""#));
    assert!(tags[1].contains(r#"id="head-1""#));
    assert!(tags.iter().all(|t| t.ends_with(r#" media="screen">"#)));
}

#[test]
fn test_url_override_before_convention() {
    let fixture = Fixture::new().with_css_pair();
    let config = fixture.config("[build]\nconcatenate = false\n[build.compile]\nenable = false\n");
    let p = Pipeline::builder(AssetKind::Css, config)
        .cache(Arc::new(MemoryCache::new()))
        .libraries(Libraries::new())
        .url_override(|d| d.is_resource.then(|| format!("//static.example.com/{}", d.name())))
        .build()
        .unwrap();

    p.add("a.css", None);
    assert_eq!(p.generate(None), vec!["//static.example.com/a.css"]);
}

// ============================================================================
// Compile stage
// ============================================================================

#[test]
fn test_compile_is_idempotent() {
    let fixture = Fixture::new().with_css_pair();
    let (p, transformer) = css(&fixture, "");
    let list = p.resolve(&strings(&["b.css"]));

    let first = p.compile(list.clone());
    assert_eq!(transformer.calls(), 2);
    let second = p.compile(list);
    assert_eq!(transformer.calls(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_two_pipelines_converge() {
    let fixture = Fixture::new().with_css_pair();
    let (one, first) = css(&fixture, "");
    let (two, second) = css(&fixture, "");

    let a = one.compile(one.resolve(&strings(&["b.css"])));
    let b = two.compile(two.resolve(&strings(&["b.css"])));

    assert_eq!(names(&a), names(&b));
    assert_eq!(first.calls(), 2);
    // the second instance finds the published targets
    assert_eq!(second.calls(), 0);
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(fs::read(x.path().unwrap()).unwrap(), fs::read(y.path().unwrap()).unwrap());
    }
}

#[test]
fn test_changed_source_invalidates_cache() {
    let fixture = Fixture::new().with_css_pair();
    let cache: Arc<dyn MetadataCache> = Arc::new(MemoryCache::new());
    let transformer = Arc::new(MockTransformer::default());
    let build = || {
        pipeline(
            AssetKind::Css,
            fixture.config(""),
            cache.clone(),
            transformer.clone(),
        )
    };

    let before = build().compile(build().resolve(&strings(&["a.css"])));
    fixture.write("a.css", "a { color: green; margin: 0; }\n");
    let after = build().compile(build().resolve(&strings(&["a.css"])));

    assert_ne!(before[0].signature, after[0].signature);
    assert_ne!(before[0].name(), after[0].name());
    assert_eq!(transformer.calls(), 2);
    let content = fs::read_to_string(after[0].path().unwrap()).unwrap();
    assert!(content.contains("green"));
}

#[test]
fn test_failing_transform_degrades_to_source() {
    let fixture = Fixture::new().with_css_pair();
    let transformer = Arc::new(MockTransformer::failing());
    let p = pipeline(
        AssetKind::Css,
        fixture.config("[build]\nconcatenate = false\n"),
        Arc::new(MemoryCache::new()),
        transformer.clone(),
    );

    p.add("a.css", None);
    assert_eq!(p.generate(None), vec!["/assets/a.css"]);
    assert_eq!(transformer.calls(), 1);

    // negative entry holds off a retry; no staging file is left behind
    let list = p.resolve(&strings(&["b.css"]));
    let again = p.compile(p.compile(list));
    assert_eq!(names(&again), vec!["b.css"]);
    assert_eq!(transformer.calls(), 2);
    let leftovers = fs::read_dir(fixture.output()).map_or(0, |d| d.count());
    assert_eq!(leftovers, 0);
}

#[test]
fn test_service_mode_serves_source_while_pending() {
    let fixture = Fixture::new().with_css_pair();
    let toml = "[build]\nconcatenate = false\n[build.compile]\nmode = \"service\"\n";
    let (p, transformer) = css(&fixture, toml);

    p.add("a.css", None);
    assert_eq!(p.generate(None), vec!["/assets/a.css"]);
    assert_eq!(transformer.spawns(), 1);
    assert_eq!(transformer.calls(), 0);

    // still inside the negative window: nothing respawned
    let list = p.resolve(&strings(&["b.css"]));
    let compiled = p.compile(list);
    assert!(compiled.iter().all(|d| d.is_resource));
    assert_eq!(transformer.spawns(), 2);
    let compiled = p.compile(compiled);
    assert!(compiled.iter().all(|d| d.is_resource));
    assert_eq!(transformer.spawns(), 2);
}

#[test]
fn test_service_result_picked_up_once_published() {
    let fixture = Fixture::new().with_css_pair();
    let toml = "[build]\nconcatenate = false\n[build.compile]\nmode = \"service\"\n";
    let (p, _) = css(&fixture, toml);
    let list = p.resolve(&strings(&["a.css"]));
    assert!(p.compile(list.clone())[0].is_resource);

    // the background job lands on the content-addressed target
    let (sync, _) = css(&fixture, "");
    let published = sync.compile(list.clone());
    assert!(!published[0].is_resource);

    let (fresh, transformer) = css(&fixture, toml);
    let compiled = fresh.compile(list);
    assert_eq!(compiled[0].name(), published[0].name());
    assert_eq!(transformer.spawns(), 0);
}

#[test]
fn test_compile_disabled_serves_sources() {
    let fixture = Fixture::new().with_css_pair();
    let (p, transformer) = css(&fixture, "[build]\nconcatenate = false\n[build.compile]\nenable = false\n");

    p.add("b.css", None);
    assert_eq!(p.generate(None), vec!["/assets/a.css", "/assets/b.css"]);
    assert_eq!(transformer.calls(), 0);
}

// ============================================================================
// Library plugins end to end
// ============================================================================

const TOOLKIT: &str = r#"
[[library]]
kind = "toolkit"
prefix = "ui/"
base_url = "https://static.example.com/ui/2.3.0"
combo_url = "https://static.example.com/combo?"
version = "2.3.0"
modules."ui/dom.js" = { path = "dom/dom-min.js" }
modules."ui/anim.js" = { path = "anim/anim-min.js", requires = ["ui/dom.js"] }
"#;

#[test]
fn test_toolkit_modules_collapse_into_combo_url() {
    let fixture = Fixture::new();
    fixture.write("app.js", "// @requires ui/anim.js\nvar app;\n");
    let config = fixture.config(TOOLKIT);
    let p = Pipeline::builder(AssetKind::Js, config.clone())
        .cache(Arc::new(MemoryCache::new()))
        .libraries(Libraries::from_config(&config))
        .transformer(Arc::new(MockTransformer::default()))
        .build()
        .unwrap();

    assert!(p.add("app.js", None));
    let urls = p.generate(None);
    assert_eq!(urls.len(), 2);
    assert_eq!(
        urls[0],
        "https://static.example.com/combo?dom/dom-min.js&anim/anim-min.js"
    );
    assert!(urls[1].starts_with("/_assets/") && urls[1].ends_with(".js"));
    assert!(p.emitted().contains("ui/anim.js"));
}

#[test]
fn test_fetched_package_becomes_plain_file() {
    let fixture = Fixture::new();
    fixture.write("base.js", "var base;\n");
    let config = fixture.config(
        r#"
[[library]]
kind = "fetch"
packages."vendor/x.js" = "https://example.com/x.js"
"#,
    );
    let fetcher = Arc::new(StaticFetcher::new("// @requires base.js\nwindow.x = base;\n"));
    let build = || {
        Pipeline::builder(AssetKind::Js, config.clone())
            .cache(Arc::new(MemoryCache::new()))
            .libraries(Libraries::from_config_with_fetcher(&config, fetcher.clone()))
            .transformer(Arc::new(MockTransformer::default()))
            .build()
            .unwrap()
    };

    let first = build();
    let list = first.resolve(&strings(&["vendor/x.js"]));
    assert_eq!(names(&list), vec!["base.js", "vendor/x.js"]);
    let fetched = &list[1];
    assert!(fetched.library.is_none());
    assert_eq!(fetched.path(), Some(config.paths.source.join("vendor/x.js").as_path()));

    // a fresh pipeline finds the download on disk
    let second = build();
    let again = second.resolve(&strings(&["vendor/x.js"]));
    assert_eq!(names(&again), vec!["base.js", "vendor/x.js"]);
    assert!(again[1].library.is_none());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Concatenation caching
// ============================================================================

#[test]
fn test_merge_follows_order_across_pipelines() {
    let fixture = Fixture::new();
    fixture.write("x.css", "x { top: 0; }\n");
    fixture.write("y.css", "y { top: 1; }\n");
    let cache: Arc<dyn MetadataCache> = Arc::new(MemoryCache::new());
    let build = || {
        pipeline(
            AssetKind::Css,
            fixture.config("[build.compile]\nenable = false\n"),
            cache.clone(),
            Arc::new(MockTransformer::default()),
        )
    };

    let one = build();
    let xy = one.concatenate(one.resolve(&strings(&["x.css", "y.css"])));
    let two = build();
    let yx = two.concatenate(two.resolve(&strings(&["y.css", "x.css"])));

    assert_eq!(xy.len(), 1);
    assert_eq!(yx.len(), 1);
    assert_ne!(xy[0].name(), yx[0].name());
    let merged = fs::read_to_string(yx[0].path().unwrap()).unwrap();
    assert!(merged.find("/* y.css */").unwrap() < merged.find("/* x.css */").unwrap());
}

#[test]
fn test_changed_source_invalidates_merge() {
    let fixture = Fixture::new().with_css_pair();
    let cache: Arc<dyn MetadataCache> = Arc::new(MemoryCache::new());
    let build = || {
        pipeline(
            AssetKind::Css,
            fixture.config("[build]\nsignature = \"hash\"\n"),
            cache.clone(),
            Arc::new(MockTransformer::default()),
        )
    };

    let p = build();
    p.add("b.css", None);
    let before = p.generate(None);

    fixture.write("a.css", "a { color: green; }\n");
    let p = build();
    p.add("b.css", None);
    let after = p.generate(None);

    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 1);
    assert_ne!(before, after);
    let merged = fs::read_to_string(fixture.output().join(after[0].trim_start_matches("/_assets/")))
        .unwrap();
    assert!(merged.contains("green"));
    assert!(!merged.contains("color: red"));
}

#[cfg(unix)]
#[test]
fn test_published_artifacts_are_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = Fixture::new().with_css_pair();
    let (p, _) = css(&fixture, "");
    p.add("b.css", None);
    let urls = p.generate(None);

    let merged = fixture.output().join(urls[0].trim_start_matches("/_assets/"));
    let mode = fs::metadata(merged).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}
