//! Tokenizers backing the field kinds, and their per-index registration.
//!
//! Tantivy resolves tokenizers by name at indexing time, so every index an
//! engine opens or creates must have the names its schema references
//! registered first. Names are derived from the field settings
//! (`ngram_2_10`, `wordngram_2_10`, `kw_comma_ci`, ...) so two fields with
//! identical settings share one registration.

use tantivy::Index;
use tantivy::tokenizer::{LowerCaser, NgramTokenizer, TextAnalyzer, Token, TokenStream, Tokenizer};

use crate::field::{FieldSpec, IndexKind, KeywordDelimiter};
use crate::schema::Schema;

/// Tokenizer name for a character-ngram field.
pub fn ngram_tokenizer_name(min: usize, max: usize) -> String {
    format!("ngram_{min}_{max}")
}

/// Tokenizer name for a per-word-ngram field.
pub fn word_ngram_tokenizer_name(min: usize, max: usize) -> String {
    format!("wordngram_{min}_{max}")
}

/// Tokenizer name for a keyword field.
pub fn keyword_tokenizer_name(delimiter: KeywordDelimiter, case_insensitive: bool) -> String {
    let delim = match delimiter {
        KeywordDelimiter::Comma => "comma",
        KeywordDelimiter::Whitespace => "space",
    };
    let case = if case_insensitive { "ci" } else { "cs" };
    format!("kw_{delim}_{case}")
}

/// The tokenizer name a field indexes under, if the field is tokenized.
pub fn tokenizer_name(spec: &FieldSpec) -> Option<String> {
    match spec.index_kind {
        IndexKind::Ngram => Some(ngram_tokenizer_name(spec.ngram_min, spec.ngram_max)),
        IndexKind::NgramWords => Some(word_ngram_tokenizer_name(spec.ngram_min, spec.ngram_max)),
        IndexKind::Phrase => Some("default".to_string()),
        IndexKind::Keyword => Some(keyword_tokenizer_name(
            spec.keyword_delimiter,
            spec.keyword_case_insensitive,
        )),
        IndexKind::Stored | IndexKind::Numeric => None,
    }
}

/// Register every tokenizer the schema's fields reference on `index`.
///
/// Idempotent; re-registering a name replaces an identical analyzer.
pub fn register_tokenizers(index: &Index, schema: &Schema) {
    for spec in schema.fields() {
        match spec.index_kind {
            IndexKind::Ngram => {
                let name = ngram_tokenizer_name(spec.ngram_min, spec.ngram_max);
                // The range was validated at schema construction, so the
                // constructor cannot reject it.
                let tokenizer = NgramTokenizer::new(spec.ngram_min, spec.ngram_max, false)
                    .expect("ngram range validated at schema construction");
                let analyzer = TextAnalyzer::builder(tokenizer).filter(LowerCaser).build();
                index.tokenizers().register(&name, analyzer);
            }
            IndexKind::NgramWords => {
                let name = word_ngram_tokenizer_name(spec.ngram_min, spec.ngram_max);
                let tokenizer = WordNgramTokenizer::new(spec.ngram_min, spec.ngram_max);
                let analyzer = TextAnalyzer::builder(tokenizer).filter(LowerCaser).build();
                index.tokenizers().register(&name, analyzer);
            }
            IndexKind::Keyword => {
                let name = keyword_tokenizer_name(
                    spec.keyword_delimiter,
                    spec.keyword_case_insensitive,
                );
                let tokenizer = KeywordTokenizer::new(spec.keyword_delimiter);
                let analyzer = if spec.keyword_case_insensitive {
                    TextAnalyzer::builder(tokenizer).filter(LowerCaser).build()
                } else {
                    TextAnalyzer::builder(tokenizer).build()
                };
                index.tokenizers().register(&name, analyzer);
            }
            IndexKind::Stored | IndexKind::Phrase | IndexKind::Numeric => {}
        }
    }
}

/// All character windows of exactly `size` characters. Char-based, so
/// multi-byte text slices cleanly.
pub fn char_windows(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if size == 0 || chars.len() < size {
        return Vec::new();
    }
    (0..=chars.len() - size)
        .map(|start| chars[start..start + size].iter().collect())
        .collect()
}

/// A token stream materialized up front. Both custom tokenizers produce
/// their full token list eagerly; dataset field values are short.
pub struct MaterializedTokenStream {
    tokens: Vec<Token>,
    upto: usize,
}

impl MaterializedTokenStream {
    fn new(tokens: Vec<Token>) -> Self {
        MaterializedTokenStream { tokens, upto: 0 }
    }
}

impl TokenStream for MaterializedTokenStream {
    fn advance(&mut self) -> bool {
        if self.upto < self.tokens.len() {
            self.upto += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.upto - 1]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.upto - 1]
    }
}

/// Emits every n-gram of length `min..=max` within each alphanumeric word,
/// never crossing word boundaries.
#[derive(Clone)]
pub struct WordNgramTokenizer {
    min: usize,
    max: usize,
}

impl WordNgramTokenizer {
    pub fn new(min: usize, max: usize) -> Self {
        WordNgramTokenizer { min, max }
    }
}

impl Tokenizer for WordNgramTokenizer {
    type TokenStream<'a> = MaterializedTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> MaterializedTokenStream {
        let mut tokens = Vec::new();
        let mut position = 0;
        for (word_offset, word) in split_words(text) {
            let chars: Vec<(usize, char)> = word.char_indices().collect();
            for size in self.min..=self.max {
                if size == 0 || chars.len() < size {
                    continue;
                }
                for start in 0..=chars.len() - size {
                    let from = chars[start].0;
                    let to = chars
                        .get(start + size)
                        .map(|(idx, _)| *idx)
                        .unwrap_or(word.len());
                    tokens.push(Token {
                        offset_from: word_offset + from,
                        offset_to: word_offset + to,
                        position,
                        text: word[from..to].to_string(),
                        position_length: 1,
                    });
                    position += 1;
                }
            }
        }
        MaterializedTokenStream::new(tokens)
    }
}

/// Splits a keyword value into its exact-match tokens on the configured
/// delimiter. Comma mode trims surrounding whitespace from each token, so
/// `"Crime, Drama"` yields `Crime` and `Drama`.
#[derive(Clone)]
pub struct KeywordTokenizer {
    delimiter: KeywordDelimiter,
}

impl KeywordTokenizer {
    pub fn new(delimiter: KeywordDelimiter) -> Self {
        KeywordTokenizer { delimiter }
    }
}

impl Tokenizer for KeywordTokenizer {
    type TokenStream<'a> = MaterializedTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> MaterializedTokenStream {
        let mut tokens = Vec::new();
        let mut position = 0;
        let mut push = |offset: usize, raw: &str| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return;
            }
            let from = offset + (trimmed.as_ptr() as usize - raw.as_ptr() as usize);
            tokens.push(Token {
                offset_from: from,
                offset_to: from + trimmed.len(),
                position,
                text: trimmed.to_string(),
                position_length: 1,
            });
            position += 1;
        };
        match self.delimiter {
            KeywordDelimiter::Comma => {
                let mut offset = 0;
                for part in text.split(',') {
                    push(offset, part);
                    offset += part.len() + 1;
                }
            }
            KeywordDelimiter::Whitespace => {
                for (offset, part) in split_words_whitespace(text) {
                    push(offset, part);
                }
            }
        }
        MaterializedTokenStream::new(tokens)
    }
}

/// Alphanumeric word runs with their byte offsets.
fn split_words(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            start.get_or_insert(idx);
        } else if let Some(from) = start.take() {
            words.push((from, &text[from..idx]));
        }
    }
    if let Some(from) = start {
        words.push((from, &text[from..]));
    }
    words
}

/// Whitespace-separated runs with their byte offsets.
fn split_words_whitespace(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        if !ch.is_whitespace() {
            start.get_or_insert(idx);
        } else if let Some(from) = start.take() {
            words.push((from, &text[from..idx]));
        }
    }
    if let Some(from) = start {
        words.push((from, &text[from..]));
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(mut tokenizer: impl Tokenizer, input: &str) -> Vec<String> {
        let mut stream = tokenizer.token_stream(input);
        let mut out = Vec::new();
        while stream.advance() {
            out.push(stream.token().text.clone());
        }
        out
    }

    #[test]
    fn char_windows_basic() {
        assert_eq!(char_windows("abcd", 2), vec!["ab", "bc", "cd"]);
        assert_eq!(char_windows("ab", 3), Vec::<String>::new());
        assert_eq!(char_windows("ab", 0), Vec::<String>::new());
    }

    #[test]
    fn word_ngrams_stay_inside_words() {
        let tokens = texts(WordNgramTokenizer::new(3, 3), "god father");
        assert!(tokens.contains(&"god".to_string()));
        assert!(tokens.contains(&"fat".to_string()));
        // No window spans the space.
        assert!(!tokens.contains(&"d f".to_string()));
    }

    #[test]
    fn word_ngrams_cover_the_full_range() {
        let tokens = texts(WordNgramTokenizer::new(2, 4), "dune");
        assert!(tokens.contains(&"du".to_string()));
        assert!(tokens.contains(&"une".to_string()));
        assert!(tokens.contains(&"dune".to_string()));
    }

    #[test]
    fn keyword_comma_trims_whitespace() {
        let tokens = texts(KeywordTokenizer::new(KeywordDelimiter::Comma), "Crime, Drama ,  War");
        assert_eq!(tokens, vec!["Crime", "Drama", "War"]);
    }

    #[test]
    fn keyword_whitespace_splits_on_runs() {
        let tokens = texts(KeywordTokenizer::new(KeywordDelimiter::Whitespace), "HR  IT\tFinance");
        assert_eq!(tokens, vec!["HR", "IT", "Finance"]);
    }

    #[test]
    fn keyword_offsets_point_into_the_source() {
        let input = "a, bb";
        let mut tokenizer = KeywordTokenizer::new(KeywordDelimiter::Comma);
        let mut stream = tokenizer.token_stream(input);
        while stream.advance() {
            let token = stream.token();
            assert_eq!(&input[token.offset_from..token.offset_to], token.text);
        }
    }
}
