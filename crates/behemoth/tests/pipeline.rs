//! Chained stages over corpus files on disk.

use behemoth::stage::PassThrough;
use behemoth::{
    Annotation, Configuration, CorpusReader, CorpusWriter, Document, DocumentSplitter,
    FieldMapping, StageRunner,
};

fn article(n: usize, lang: &str) -> Document {
    let mut doc = Document::new(format!("https://news.example.com/{}", n));
    doc.content_type = Some("text/html; charset=utf-8".into());
    doc.content = Some(format!("<p>Ada wrote. Alan read {}.</p>", n).into_bytes());
    doc.text = Some(format!("Ada wrote. Alan read {}.", n));
    doc.metadata_mut().insert("lang".into(), lang.into());
    doc.annotations = vec![
        Annotation::new("Sentence", 11, 23),
        Annotation::new("Person", 11, 15),
        Annotation::new("Sentence", 0, 10),
        Annotation::new("Person", 0, 3),
    ];
    doc
}

fn read_all(path: &std::path::Path) -> Vec<Document> {
    CorpusReader::open(path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[tokio::test]
async fn filter_then_split_then_export() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.bin");
    let filtered = dir.path().join("filtered.bin");
    let split = dir.path().join("split.bin");

    let mut writer = CorpusWriter::create(&raw).unwrap();
    for (n, lang) in ["en", "de", "en"].iter().enumerate() {
        writer.write(&article(n, lang)).unwrap();
    }
    writer.finish().unwrap();

    let mut conf = Configuration::from_toml_str(
        r#"
        [document.filter.md.keep]
        lang = "en"

        [document.splitter]
        type = "Sentence"
        "keep.metadata" = true

        [stage]
        "drop.content" = true
        "#,
    )
    .unwrap();
    conf.apply_overrides(&["document.filter.mimetype.keep=text/html"])
        .unwrap();

    // filter
    let mut out = CorpusWriter::create(&filtered).unwrap();
    let counters = StageRunner::from_config(&conf, PassThrough)
        .unwrap()
        .run(CorpusReader::open(&raw).unwrap(), &mut out, None)
        .await
        .unwrap();
    out.finish().unwrap();
    assert_eq!(counters.read, 3);
    assert_eq!(counters.filtered, 1);

    let docs = read_all(&filtered);
    assert_eq!(docs.len(), 2);
    // The codec stores the cleaned content type.
    assert_eq!(docs[0].content_type.as_deref(), Some("text/html"));
    assert!(docs[0].content.is_none());

    // split
    let splitter = DocumentSplitter::from_config(&conf).unwrap();
    let mut out = CorpusWriter::create(&split).unwrap();
    let counters = StageRunner::new(splitter)
        .run(CorpusReader::open(&filtered).unwrap(), &mut out, None)
        .await
        .unwrap();
    out.finish().unwrap();
    assert_eq!(counters.written, 4);

    let parts = read_all(&split);
    assert_eq!(parts[0].url, "https://news.example.com/0#0-10");
    assert_eq!(parts[0].text.as_deref(), Some("Ada wrote."));
    assert_eq!(parts[1].text.as_deref(), Some("Alan read 0."));
    assert_eq!(parts[1].metadata_value("lang"), Some("en"));
    assert_eq!(parts[1].annotations[0].kind, "Person");
    assert_eq!(parts[1].annotations[0].start, 0);

    // export
    let mapping = FieldMapping::parse(&["Person.*=people"]).unwrap();
    let value = mapping.export(&parts[1]);
    assert_eq!(value["people"][0], "Alan");
}
