//! Integration tests for multi-format EULA files in install directories.
//!
//! Each format is placed in a fake game directory and run through the
//! local scanner, so extraction, name/content matching and tagging are
//! exercised together.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use eula_scan::extract;
use eula_scan::local_scan::LocalScanner;
use eula_scan::models::MatchKind;

fn scanner() -> LocalScanner {
    LocalScanner::with_limit(1000).unwrap()
}

/// Minimal docx (ZIP) whose `word/document.xml` holds one paragraph per item.
fn minimal_docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file(
            "word/document.xml",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        let xml = format!(
            concat!(
                "<?xml version=\"1.0\"?>",
                "<w:document xmlns:w=\"http://schemas.openxmlformats.org/",
                "wordprocessingml/2006/main\">",
                "<w:body>{}</w:body></w:document>",
            ),
            body
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

/// Minimal PDF with one page per entry; `None` gives a page with an empty
/// content stream. Offsets in the xref table are computed as the body is
/// written so pdf-extract can parse it.
fn minimal_pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
    let font_id = 3 + 2 * pages.len();
    let mut offsets = Vec::new();
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");

    let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "2 0 obj << /Type /Pages /Kids [{}] /Count {} >> endobj\n",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );

    for (i, page) in pages.iter().enumerate() {
        let page_id = 3 + 2 * i;
        let content_id = page_id + 1;
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Contents {} 0 R /Resources << /Font << /F1 {} 0 R >> >> >> endobj\n",
                page_id, content_id, font_id
            )
            .as_bytes(),
        );
        let stream = match page {
            Some(text) => format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text),
            None => String::new(),
        };
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
                content_id,
                stream.len(),
                stream
            )
            .as_bytes(),
        );
    }

    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "{} 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
            font_id
        )
        .as_bytes(),
    );

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

fn game_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("docs")).unwrap();
    tmp
}

fn only_candidate(root: &Path, game: &str) -> (String, MatchKind) {
    let found = scanner().scan(game, root);
    assert_eq!(found.len(), 1, "expected one candidate, got {:?}", found);
    (found[0].text.clone(), found[0].match_kind)
}

#[test]
fn docx_license_matched_by_content() {
    let tmp = game_dir();
    fs::write(
        tmp.path().join("docs/License.docx"),
        minimal_docx_with_paragraphs(&["Half-Life 2 End User License", "Kernel driver installed."]),
    )
    .unwrap();

    let (text, kind) = only_candidate(tmp.path(), "Half-Life 2");
    assert_eq!(kind, MatchKind::ContentMatch);
    assert_eq!(text.trim(), "Half-Life 2 End User License\nKernel driver installed.");
}

#[test]
fn html_eula_matched_by_filename() {
    let tmp = game_dir();
    fs::write(
        tmp.path().join("docs/halflife2_EULA.HTML"),
        "<html><head><style>p{}</style></head><body><h1>EULA</h1><p>Terms.</p></body></html>",
    )
    .unwrap();

    let (text, kind) = only_candidate(tmp.path(), "Half-Life 2");
    assert_eq!(kind, MatchKind::FilenameMatch);
    assert_eq!(text, "EULA\nTerms.");
}

#[test]
fn htm_is_found_recursively() {
    let tmp = game_dir();
    fs::write(
        tmp.path().join("docs/legal_notice.htm"),
        "<p>Half-Life 2 legal notice</p>",
    )
    .unwrap();

    let (_, kind) = only_candidate(tmp.path(), "Half-Life 2");
    assert_eq!(kind, MatchKind::ContentMatch);
}

#[test]
fn rtf_eula_in_root_is_generic_fallback() {
    let tmp = game_dir();
    fs::write(
        tmp.path().join("EULA.rtf"),
        r"{\rtf1\ansi{\fonttbl{\f0 Arial;}}\f0 Standard terms\par Caf\'e9\par}",
    )
    .unwrap();

    let (text, kind) = only_candidate(tmp.path(), "Half-Life 2");
    assert_eq!(kind, MatchKind::GenericRoot);
    assert!(text.contains("Standard terms"), "{}", text);
    assert!(text.contains("Café"), "{}", text);
    assert!(!text.contains("Arial"), "{}", text);
}

#[test]
fn utf16_readme_is_decoded() {
    let tmp = game_dir();
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "Half-Life 2 readme".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(tmp.path().join("docs/README.txt"), bytes).unwrap();

    let (text, kind) = only_candidate(tmp.path(), "Half-Life 2");
    assert_eq!(kind, MatchKind::ContentMatch);
    assert_eq!(text, "Half-Life 2 readme");
}

#[test]
fn pdf_pages_are_joined_in_order_without_blank_pages() {
    let tmp = game_dir();
    let path = tmp.path().join("docs/halflife2_eula.pdf");
    fs::write(
        &path,
        minimal_pdf_with_pages(&[
            Some("First page terms"),
            None,
            Some("Second page BattlEye"),
        ]),
    )
    .unwrap();

    let text = extract::try_extract_file(&path, 1_000_000).unwrap();
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    assert_eq!(lines, vec!["First page terms", "Second page BattlEye"], "{:?}", text);
    assert!(text.ends_with('\n'), "{:?}", text);

    let found = LocalScanner::with_limit(1_000_000)
        .unwrap()
        .scan("Half-Life 2", tmp.path());
    assert_eq!(found.len(), 1, "{:?}", found);
    assert_eq!(found[0].match_kind, MatchKind::FilenameMatch);
    assert_eq!(found[0].text, text);
}

#[test]
fn corrupt_pdf_is_absorbed() {
    let tmp = game_dir();
    fs::write(tmp.path().join("docs/halflife2_eula.pdf"), b"not a valid pdf").unwrap();
    fs::write(tmp.path().join("docs/bad_license.docx"), b"not a zip").unwrap();

    // The filename still matches, so the PDF is kept with empty text.
    let (text, kind) = only_candidate(tmp.path(), "Half-Life 2");
    assert_eq!(kind, MatchKind::FilenameMatch);
    assert_eq!(text, "");
    assert!(extract::try_extract_file(&tmp.path().join("docs/bad_license.docx"), 1000).is_err());
}

#[test]
fn oversized_file_yields_empty_text() {
    let tmp = game_dir();
    fs::write(tmp.path().join("license.txt"), "x".repeat(2000)).unwrap();

    // Empty text means no content match and no generic-root candidate.
    assert!(scanner().scan("Half-Life 2", tmp.path()).is_empty());
    assert!(matches!(
        extract::try_extract_file(&tmp.path().join("license.txt"), 1000),
        Err(extract::ExtractError::TooLarge { size: 2000, limit: 1000 })
    ));
}

#[test]
fn unknown_extension_is_empty_and_never_fails() {
    let tmp = game_dir();
    let path = tmp.path().join("eula.md");
    fs::write(&path, "Half-Life 2 terms").unwrap();
    assert_eq!(extract::extract_file(&path, 1000), "");
    assert!(scanner().scan("Half-Life 2", tmp.path()).is_empty());
}
