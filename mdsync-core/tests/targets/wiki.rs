use crate::support::{parse, KITCHENSINK};
use insta::assert_snapshot;
use mdsync_core::formats::wiki::{WikiPageTarget, WikiPayload};
use mdsync_core::ir::nodes::{Block, Callout, CalloutKind};
use mdsync_core::target::Target;

#[test]
fn kitchensink_renders_to_storage_format() {
    let payload = WikiPageTarget.render(&parse(KITCHENSINK)).unwrap();
    assert_eq!(payload.title.as_deref(), Some("Release Guide"));
    assert_snapshot!(payload.storage, @r#"
<h1><ac:structured-macro ac:name="anchor"><ac:parameter ac:name="">overview</ac:parameter></ac:structured-macro>Overview</h1>
<p>Ship <strong>fast</strong> and <em>safely</em>, see <a href="https://example.com/docs">the docs</a>.</p>
<ac:structured-macro ac:name="warning"><ac:parameter ac:name="title">Careful</ac:parameter><ac:rich-text-body><p>Do not skip <code>cargo test</code>.</p></ac:rich-text-body></ac:structured-macro>
<ac:structured-macro ac:name="note"><ac:rich-text-body><p>Plain quotes become notes.</p></ac:rich-text-body></ac:structured-macro>
<ul><li><p>first</p></li><li><p>second</p><ol><li><p>nested</p></li></ol></li></ul>
<table><tbody><tr><th>Key</th><th>Value</th></tr><tr><td>a</td><td>1</td></tr></tbody></table>
<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">rust</ac:parameter><ac:plain-text-body><![CDATA[fn main() {}]]></ac:plain-text-body></ac:structured-macro>
<hr />
"#);
}

#[test]
fn kitchensink_reads_back_unchanged() {
    let doc = parse(KITCHENSINK);
    let target = WikiPageTarget;
    let back = target.parse(&target.render(&doc).unwrap()).unwrap();
    assert_eq!(back.blocks, doc.blocks);
    assert_eq!(back.declared_title(), doc.declared_title());
}

#[test]
fn hand_written_pages_degrade_gracefully() {
    let storage = concat!(
        "<p>Intro&nbsp;text</p>\n",
        "<ac:structured-macro ac:name=\"info\"><ac:rich-text-body><p>FYI</p></ac:rich-text-body></ac:structured-macro>\n",
        "<ac:structured-macro ac:name=\"toc\" />\n",
        "<ac:structured-macro ac:name=\"panel\"><ac:rich-text-body><p>Inside a panel</p></ac:rich-text-body></ac:structured-macro>\n",
        "<div><p>Wrapped</p></div>\n",
        "<p>See <ac:link><ri:page ri:content-title=\"Other Page\" /></ac:link>.</p>",
    );
    let doc = WikiPageTarget.parse(&WikiPayload::new(storage)).unwrap();
    assert_eq!(
        doc.blocks,
        vec![
            Block::text("Intro\u{a0}text"),
            Block::Callout(Callout {
                kind: CalloutKind::Info,
                title: None,
                children: vec![Block::text("FYI")],
            }),
            Block::text("Inside a panel"),
            Block::text("Wrapped"),
            Block::text("See Other Page."),
        ]
    );
}
