//! Demo driver: replays a short chat session against the direction
//! engine and prints the markers it applied.
//!
//! Pass a path to an HTML file to use it as the initial document body
//! instead of the built-in transcript.

use anyhow::Result;
use bidifix_config::BidifixConfig;
use bidifix_dom::html::{append_fragment, parse_document};
use bidifix_dom::{Document, NodeId};
use bidifix_engine::DirectionEngine;

const TRANSCRIPT: &str = r#"
<div data-message-role="user"><div class="markdown"><p>What does this mean?</p></div></div>
"#;

const REPLY_FRAGMENT: &str = r#"
<div data-message-role="assistant"><div class="markdown">
<p>המשפט אומר "שלום עולם".</p>
<pre><code>print("hello")</code></pre>
<span class="math"></span>
</div></div>
"#;

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let mut config = BidifixConfig::load_or_default();
    config.merge_with_env();
    log::info!(
        "markers: rtl={:?} math={:?}",
        config.markers.rtl_class,
        config.markers.math_class
    );

    let mut doc = match std::env::args().nth(1) {
        Some(path) => parse_document(&std::fs::read_to_string(path)?)?,
        None => parse_document(&format!("<body>{TRANSCRIPT}</body>"))?,
    };

    let mut engine = DirectionEngine::new(&config)?;
    engine.start(&mut doc)?;

    // An assistant reply arrives as one inserted subtree.
    let root = doc.root();
    let added = append_fragment(&mut doc, root, REPLY_FRAGMENT)?;
    let records = engine.pump(&mut doc);
    log::info!("processed {records} mutation records");

    // Math typesetting renders a beat later; the retry chain catches it.
    if let Some(&reply) = added.first() {
        for slot in find_by_class(&doc, reply, "math") {
            let region = doc.create_element("span");
            doc.add_class(region, "katex-html");
            doc.append_child(slot, region)?;
        }
    }
    engine.advance(&mut doc, 200);
    engine.pump(&mut doc);

    report(&doc, doc.root(), engine.policy().rtl_class.as_str(), 0);
    engine.stop(&mut doc);
    Ok(())
}

fn find_by_class(doc: &Document, root: NodeId, class: &str) -> Vec<NodeId> {
    doc.descendants(root)
        .into_iter()
        .filter(|&n| doc.has_class(n, class))
        .collect()
}

fn report(doc: &Document, node: NodeId, rtl_class: &str, depth: usize) {
    if let Some(tag) = doc.tag(node) {
        let mut flags = Vec::new();
        if doc.has_class(node, rtl_class) {
            flags.push("rtl");
        }
        if doc.attribute(node, "dir").as_deref() == Some("ltr") {
            flags.push("forced-ltr");
        }
        let marks = if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join(", "))
        };
        println!("{:indent$}<{tag}>{marks}", "", indent = depth * 2);
    }
    for &child in doc.children(node) {
        report(doc, child, rtl_class, depth + 1);
    }
}
