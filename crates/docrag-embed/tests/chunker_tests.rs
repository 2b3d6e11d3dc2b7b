use docrag_embed::{whitespace_tokenizer, TokenChunker};

fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

fn tokens_of(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[test]
fn twelve_hundred_tokens_make_three_chunks() {
    let chunker = TokenChunker::new(whitespace_tokenizer().unwrap(), 500, 50).unwrap();
    let chunks = chunker.chunk_document("data/long.txt", &words(1200)).unwrap();

    assert_eq!(chunks.len(), 3);
    for (i, c) in chunks.iter().enumerate() {
        assert_eq!(c.doc_path, "data/long.txt");
        assert_eq!(c.chunk_index, i);
        assert_eq!(c.total_chunks, 3);
    }
    assert_eq!(tokens_of(&chunks[0].content).len(), 500);
    assert_eq!(tokens_of(&chunks[2].content).len(), 300);
    assert!(chunks[1].content.starts_with("w450 "));
}

#[test]
fn chunks_respect_size_and_share_overlap() {
    let (size, overlap) = (40, 7);
    let text = words(203);
    let chunker = TokenChunker::new(whitespace_tokenizer().unwrap(), size, overlap).unwrap();
    let chunks = chunker.split_text(&text).unwrap();
    let token_lists: Vec<Vec<String>> = chunks.iter().map(|c| tokens_of(c)).collect();

    for tokens in &token_lists {
        assert!(tokens.len() <= size);
    }
    for pair in token_lists.windows(2) {
        assert_eq!(pair[0][pair[0].len() - overlap..], pair[1][..overlap]);
    }

    let mut rebuilt = token_lists[0].clone();
    for tokens in &token_lists[1..] {
        rebuilt.extend_from_slice(&tokens[overlap..]);
    }
    assert_eq!(rebuilt, tokens_of(&text));
}

#[test]
fn chunks_are_exact_substrings() {
    let text = "Alpha,  beta!\n\nGamma   delta; epsilon.\tzeta eta theta";
    let chunker = TokenChunker::new(whitespace_tokenizer().unwrap(), 4, 1).unwrap();
    let chunks = chunker.split_text(text).unwrap();

    assert!(chunks.len() > 1);
    for c in &chunks {
        assert!(text.contains(c.as_str()), "{c:?} is not a substring");
    }
    assert!(chunks[0].starts_with("Alpha"));
    assert!(chunks.last().unwrap().ends_with("theta"));
}

#[test]
fn empty_or_blank_text_has_no_chunks() {
    let chunker = TokenChunker::new(whitespace_tokenizer().unwrap(), 500, 50).unwrap();
    assert!(chunker.split_text("").unwrap().is_empty());
    assert!(chunker.split_text("  \n\t ").unwrap().is_empty());
}

#[test]
fn short_text_is_one_chunk() {
    let chunker = TokenChunker::new(whitespace_tokenizer().unwrap(), 500, 50).unwrap();
    assert_eq!(chunker.split_text("just a few words").unwrap(), vec!["just a few words".to_string()]);
}

#[test]
fn chunking_is_deterministic() {
    let chunker = TokenChunker::new(whitespace_tokenizer().unwrap(), 30, 5).unwrap();
    let text = words(100);
    assert_eq!(chunker.split_text(&text).unwrap(), chunker.split_text(&text).unwrap());
}

#[test]
fn invalid_parameters_are_config_errors() {
    assert!(TokenChunker::new(whitespace_tokenizer().unwrap(), 0, 0).is_err());
    assert!(TokenChunker::new(whitespace_tokenizer().unwrap(), 50, 50).is_err());
    assert!(TokenChunker::new(whitespace_tokenizer().unwrap(), 50, 49).is_ok());
}

#[test]
fn tokenizer_file_truncation_does_not_cut_documents_short() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tokenizer.json");
    let mut tokenizer = whitespace_tokenizer().unwrap();
    tokenizer
        .with_truncation(Some(tokenizers::TruncationParams { max_length: 128, ..Default::default() }))
        .unwrap();
    tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));
    tokenizer.save(&path, false).unwrap();

    let mut settings = docrag_core::config::Settings::default();
    settings.chunking.tokenizer = path.to_string_lossy().to_string();
    let chunker = docrag_embed::chunker_from_settings(&settings).unwrap();

    let pieces = chunker.split_text(&words(1200)).unwrap();
    assert_eq!(pieces.len(), 3);
    assert!(pieces[2].ends_with("w1199"));
}
