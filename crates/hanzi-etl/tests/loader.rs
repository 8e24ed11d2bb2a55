use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use hanzi_etl::decomposition::{CLEAN_FILE, LEGACY_FILE, LEGACY_HEADER};
use hanzi_etl::{DecompositionSource, EtlError, Glossary, LoadMode, glossary, strokes, unihan};
use hanzi_types::{Script, VariantKind};

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn write_unihan(dir: &Path) {
    write(
        &dir.join("extracted").join("Unihan_IRGSources.txt"),
        "# IRG sources\nU+4E2D\tkRSUnicode\t2.3\nU+4E2D\tkTotalStrokes\t4\nU+4E2D\tkIRG_GSource\tG0-5650\n",
    );
    // Flat fallback for the file missing from `extracted/`.
    write(
        &dir.join("Unihan_Readings.txt"),
        "U+4E2D\tkMandarin\tzhōng zhòng\nU+4E2D\tkCantonese\tzung1 zung3\n",
    );
    write(
        &dir.join("extracted").join("Unihan_Variants.txt"),
        "U+4E2D\tkZVariant\tU+4E2E<kHanYu\n",
    );
}

#[test]
fn loads_unihan_with_extracted_fallback() {
    let dir = tempfile::tempdir().unwrap();
    write_unihan(dir.path());

    for mode in [LoadMode::Mmap, LoadMode::Owned] {
        let facts = unihan::load_unihan(dir.path(), mode).expect("load unihan");
        let chars = facts.characters();
        assert_eq!(chars.len(), 1);
        assert_eq!(chars[0].glyph, '中');
        assert_eq!(chars[0].radical, Some(2));
        assert_eq!(chars[0].strokes, Some(4));

        let mandarin: Vec<(&str, bool)> = facts
            .readings()
            .iter()
            .filter(|r| r.script == Script::Mandarin)
            .map(|r| (r.value.as_str(), r.canonical))
            .collect();
        assert_eq!(mandarin, vec![("zhōng", true), ("zhòng", false)]);
        assert_eq!(facts.variants()[0].kind, VariantKind::ZVariant);
        assert_eq!(facts.variants()[0].to, '丮');
    }
}

#[test]
fn missing_unihan_export_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("Unihan_IRGSources.txt"), "");
    let err = unihan::load_unihan(dir.path(), LoadMode::Owned).unwrap_err();
    match err {
        EtlError::MissingInput { path } => {
            assert!(path.ends_with("Unihan_Readings.txt"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn decomposition_prefers_the_clean_table() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = format!(
        "<pre>\n{}\n好\t6\t吅\t女\t3\t子\t3\t\t\tx\n</pre>\n",
        LEGACY_HEADER.join("\t")
    );
    write(&dir.path().join(LEGACY_FILE), &legacy);

    let source = DecompositionSource::locate(dir.path()).unwrap();
    assert!(matches!(source, DecompositionSource::Legacy(_)));
    let edges = source.load(LoadMode::Mmap).unwrap();
    assert_eq!(edges.len(), 2);

    write(
        &dir.path().join(CLEAN_FILE),
        "Component\tLeftComponent\tRightComponent\n明\t日\t月\n林\t木\t木\n",
    );
    let source = DecompositionSource::locate(dir.path()).unwrap();
    assert!(matches!(source, DecompositionSource::Clean(_)));
    let edges = source.load(LoadMode::Mmap).unwrap();
    let parts: Vec<(char, char, u32)> = edges
        .iter()
        .map(|e| (e.parent, e.part, e.position))
        .collect();
    assert_eq!(
        parts,
        vec![('明', '日', 1), ('明', '月', 2), ('林', '木', 1), ('林', '木', 2)]
    );
}

#[test]
fn decomposition_without_sources_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = DecompositionSource::locate(dir.path()).unwrap_err();
    assert!(matches!(err, EtlError::MissingInput { .. }));
}

#[test]
fn missing_columns_error_lists_found_headers() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join(CLEAN_FILE),
        "\u{feff}Component\tLeft\tRight\n好\t女\t子\n",
    );
    let err = DecompositionSource::locate(dir.path())
        .unwrap()
        .load(LoadMode::Owned)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("LeftComponent"), "{message}");
    assert!(message.contains("RightComponent"), "{message}");
    assert!(message.contains("\"Component\", \"Left\", \"Right\""), "{message}");
}

#[test]
fn glossary_reads_gzip_and_plain_dictionaries() {
    let dir = tempfile::tempdir().unwrap();
    let text = "# CC-CEDICT\n中國 中国 [Zhong1 guo2] /China/\n中 中 [zhong1] /middle/center/\n";

    let gz_path = dir.path().join("cedict.txt.gz");
    let mut enc = GzEncoder::new(fs::File::create(&gz_path).unwrap(), Compression::default());
    enc.write_all(text.as_bytes()).unwrap();
    enc.finish().unwrap();

    let plain_path = dir.path().join("cedict.txt");
    write(&plain_path, text);

    for path in [gz_path, plain_path] {
        let g = Glossary::load(&path).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.english_for("中"), "middle, center");
        assert_eq!(g.lookup("中国")[0].pinyin, "Zhong1 guo2");
    }
}

#[test]
fn vocabulary_merge_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let dict = dir.path().join("cedict.txt");
    write(&dict, "你好 你好 [ni3 hao3] /hello/hi/\n");
    let vocab = dir.path().join("hsk30.csv");
    write(
        &vocab,
        "\u{feff}ID,Simplified,Traditional,Pinyin,POS,Level\nL1-0001,你好,你好,nǐ hǎo,IJ,1\nL1-0002,谢谢,謝謝,xièxie,V,1\n",
    );
    let g = Glossary::load(&dict).unwrap();
    let rows = glossary::load_vocabulary(&vocab, &g).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].english, "hello, hi");
    assert_eq!(rows[1].english, "");
    assert_eq!(rows[1].traditional, "謝謝");

    let missing = glossary::load_vocabulary(dir.path().join("absent.csv"), &g).unwrap_err();
    assert!(matches!(missing, EtlError::MissingInput { .. }));
}

#[test]
fn stroke_dictionary_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dictionary.txt");
    write(
        &path,
        "{\"character\":\"好\",\"radical\":\"女\",\"matches\":[[0],[0],[0],[1],[1],[1]]}\r\n\r\n",
    );
    let map = strokes::load_dictionary(&path, LoadMode::Mmap).unwrap();
    assert_eq!(map["好"].components, vec![vec![0, 1, 2], vec![3, 4, 5]]);
}

#[test]
fn glossary_reads_every_gzip_member() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cedict.txt.gz");
    let mut file = fs::File::create(&path).unwrap();
    for member in ["貓 猫 [mao1] /cat/\n", "狗 狗 [gou3] /dog/\n"] {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(member.as_bytes()).unwrap();
        file.write_all(&enc.finish().unwrap()).unwrap();
    }
    drop(file);

    let g = Glossary::load(&path).unwrap();
    assert_eq!(g.len(), 2);
    assert_eq!(g.english_for("猫"), "cat");
    assert_eq!(g.english_for("狗"), "dog");
}
