//! End-to-end builds of small sites written to a temp directory.

use quire::build::{self, INDEX_FILE, SITEMAP_FILE};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

#[test]
fn single_page_fills_the_skeleton() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(src.path(), "index.md", "---\ntitle: Home\n---\n# Hi\n");
    write(
        src.path(),
        "templates/default.html",
        "<title>{{title}}</title>{{content}}",
    );

    let report = build::build(src.path(), out.path()).unwrap();

    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.pages, ["/"]);
    assert_eq!(
        read(out.path(), "index.html").trim_end(),
        "<title>Home</title><h1>Hi</h1>"
    );
}

#[test]
fn section_index_lists_its_posts() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(
        src.path(),
        "blog/index.md",
        "---\ntitle: Blog\n---\n:::children sort=date-desc\n<p>{{title}}</p>\n:::\n",
    );
    write(
        src.path(),
        "blog/old.md",
        "---\ntitle: Old\ndate: 2023-05-01\n---\nold",
    );
    write(
        src.path(),
        "blog/new.md",
        "---\ntitle: New\ndate: 2024-05-01\n---\nnew",
    );
    write(src.path(), "templates/default.html", "{{content}}");

    build::build(src.path(), out.path()).unwrap();

    let html = read(out.path(), "blog/index.html");
    let new = html.find("<p>New</p>").expect("New listed");
    let old = html.find("<p>Old</p>").expect("Old listed");
    assert!(new < old);
    assert!(!html.contains("<p>Blog</p>"));
}

#[test]
fn stock_skeleton_and_site_files() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(
        src.path(),
        "config.toml",
        "[site]\nname = \"Demo\"\nurl = \"https://demo.test\"\nbase_path = \"/docs\"\n",
    );
    write(src.path(), "index.md", "---\ntitle: Home\n---\nWelcome.");
    write(
        src.path(),
        "010-guide.md",
        "---\ntitle: Guide\nlabels: [intro]\n---\nRead [home](/ \"Home\").",
    );

    let report = build::build(src.path(), out.path()).unwrap();
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.label_pages, ["/labels/intro/"]);

    let guide = read(out.path(), "guide/index.html");
    assert!(guide.contains("<title>Guide | Demo</title>"));
    assert!(guide.contains(r#"href="/docs/guide/""#));

    let sitemap = read(out.path(), SITEMAP_FILE);
    assert!(sitemap.contains("<loc>https://demo.test/docs/guide/</loc>"));
    assert!(!sitemap.contains("/labels/"));

    let robots = read(out.path(), "robots.txt");
    assert!(robots.contains("Sitemap: https://demo.test/docs/sitemap.xml"));

    let index: serde_json::Value = serde_json::from_str(&read(out.path(), INDEX_FILE)).unwrap();
    let urls: Vec<&str> = index
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["url"].as_str().unwrap())
        .collect();
    assert!(urls.contains(&"/guide/"));
    assert!(urls.contains(&"/labels/intro/"));

    assert!(read(out.path(), "llms.txt").starts_with("# Demo\n"));
}

#[test]
fn broken_component_does_not_stop_the_build() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(src.path(), "index.md", "---\ntitle: Home\n---\nhi");
    write(src.path(), "components/bad.toml", "[[tag]\nname = ");
    write(
        src.path(),
        "components/good.toml",
        "[[tag]]\nname = \"shout\"\nhtml = \"<b>{title}</b>\"\n",
    );
    write(src.path(), "templates/default.html", "{{shout}}{{content}}");

    let report = build::build(src.path(), out.path()).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.components.tags, 1);
    assert_eq!(report.components.rejected.len(), 1);
    assert!(read(out.path(), "index.html").starts_with("<b>Home</b>"));
}

#[test]
fn check_reports_without_writing() {
    let src = TempDir::new().unwrap();
    write(src.path(), "index.md", "# Home");
    write(src.path(), "bad.md", "---\ntitle: [oops\n---\nx");

    let report = build::check(src.path()).unwrap();

    assert_eq!(report.pages, ["/"]);
    assert_eq!(report.failures.len(), 1);
    assert!(!src.path().join("dist").exists());
}
