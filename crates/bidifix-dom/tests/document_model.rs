use anyhow::Result;
use bidifix_dom::html::{append_fragment, parse_document};
use bidifix_dom::{MutationFilter, MutationKind, ShadowProbe, ShadowRootMode};

#[test]
fn chat_transcript_round_trip() -> Result<()> {
    let mut doc = parse_document(
        r#"
        <html><body>
            <div data-message-role="assistant">
                <div class="markdown">
                    <p>First answer</p>
                    <pre><code>let x = 1;</code></pre>
                </div>
            </div>
        </body></html>
        "#,
    )?;

    let message = doc.children(doc.root())[0];
    assert_eq!(
        doc.attribute(message, "data-message-role").as_deref(),
        Some("assistant")
    );
    assert!(doc.text_content(message).contains("let x = 1;"));

    // A later streamed message shows up as a single insertion record.
    let root = doc.root();
    let obs = doc.observe(root, MutationFilter::content());
    let added = append_fragment(
        &mut doc,
        root,
        r#"<div data-message-role="assistant"><div class="markdown"><p>پاسخ دوم</p></div></div>"#,
    )?;
    assert_eq!(added.len(), 1);

    let records = doc.take_records(obs);
    assert_eq!(records.len(), 1);
    assert!(matches!(records[0].kind, MutationKind::ChildList { .. }));
    Ok(())
}

#[test]
fn closed_shadow_contents_stay_private_but_writable_via_handle() -> Result<()> {
    let mut doc = parse_document(r#"<body><div id="widget"></div></body>"#)?;
    let host = doc.children(doc.root())[0];

    // The attaching code keeps the only handle to a closed root.
    let shadow = doc.attach_shadow(host, ShadowRootMode::Closed)?;
    let para = doc.create_element("p");
    let text = doc.create_text("מלל נסתר");
    doc.append_child(para, text)?;
    doc.append_child(shadow, para)?;

    assert_eq!(doc.shadow_probe(host), ShadowProbe::Closed);
    assert_eq!(doc.text_content(host), "");
    assert_eq!(doc.text_content(shadow), "מלל נסתר");
    Ok(())
}

#[test]
fn detach_reports_removal_to_scoped_observers() -> Result<()> {
    let mut doc = parse_document(r#"<body><section><p>old</p></section></body>"#)?;
    let section = doc.children(doc.root())[0];
    let para = doc.children(section)[0];

    let obs = doc.observe(doc.root(), MutationFilter::content());
    doc.detach(para);

    let records = doc.take_records(obs);
    assert_eq!(records.len(), 1);
    match &records[0].kind {
        MutationKind::ChildList { added, removed } => {
            assert!(added.is_empty());
            assert_eq!(removed, &vec![para]);
        }
        other => panic!("unexpected record {other:?}"),
    }

    // Detached subtrees are still readable through their ids.
    assert_eq!(doc.text_content(para), "old");
    assert!(doc.parent(para).is_none());
    Ok(())
}
