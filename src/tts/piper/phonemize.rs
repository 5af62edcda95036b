//! Misaki G2P wrapper producing Piper phoneme ids.
//!
//! Misaki emits Kokoro-style phonemes, which fold diphthongs and affricates
//! into single placeholder letters (`A` for `eɪ`, `ʤ` for `dʒ`, ...). Piper
//! voices are trained on espeak IPA, so those placeholders are expanded
//! before each codepoint is looked up in the voice's phoneme id map.

use crate::error::{Result, TtsError};
use std::collections::HashMap;

/// Beginning-of-utterance symbol.
const BOS: &str = "^";
/// End-of-utterance symbol.
const EOS: &str = "$";
/// Inter-phoneme padding symbol.
const PAD: &str = "_";

/// Thin wrapper around `misaki-rs` G2P.
pub struct Phonemizer {
    g2p: misaki_rs::G2P,
}

impl Phonemizer {
    /// Create an American English phonemizer.
    pub fn new() -> Self {
        Self {
            g2p: misaki_rs::G2P::new(misaki_rs::Language::EnglishUS),
        }
    }

    /// Convert text to an espeak-style IPA string.
    ///
    /// # Errors
    ///
    /// Returns an error if phonemization fails or produces nothing.
    pub fn phonemize(&self, text: &str) -> Result<String> {
        let (phonemes, _tokens) = self
            .g2p
            .g2p(text)
            .map_err(|e| TtsError::Synthesis(format!("phonemization failed: {e}")))?;
        let ipa = expand_misaki_symbols(&phonemes);
        if ipa.trim().is_empty() {
            return Err(TtsError::Synthesis(
                "phonemization produced empty output".into(),
            ));
        }
        Ok(ipa)
    }
}

impl Default for Phonemizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand misaki placeholder letters into espeak IPA sequences.
pub fn expand_misaki_symbols(phonemes: &str) -> String {
    let mut out = String::with_capacity(phonemes.len() * 2);
    for ch in phonemes.chars() {
        match ch {
            'A' => out.push_str("eɪ"),
            'I' => out.push_str("aɪ"),
            'W' => out.push_str("aʊ"),
            'Y' => out.push_str("ɔɪ"),
            'O' => out.push_str("oʊ"),
            'Q' => out.push_str("əʊ"),
            'ʤ' => out.push_str("dʒ"),
            'ʧ' => out.push_str("tʃ"),
            'ᵊ' => out.push('ə'),
            other => out.push(other),
        }
    }
    out
}

/// Map an IPA string onto Piper ids: `^ _ (p _)* $`.
///
/// Codepoints missing from `id_map` are skipped, the same way Piper itself
/// drops phonemes a voice was not trained on. Returns the ids and the
/// number of skipped codepoints.
///
/// # Errors
///
/// Returns an error if the map lacks the `^`, `$`, or `_` control symbols.
pub fn phoneme_ids(ipa: &str, id_map: &HashMap<String, Vec<i64>>) -> Result<(Vec<i64>, usize)> {
    let control = |symbol: &str| {
        id_map.get(symbol).cloned().ok_or_else(|| {
            TtsError::Model(format!("phoneme_id_map is missing control symbol {symbol:?}"))
        })
    };
    let bos = control(BOS)?;
    let eos = control(EOS)?;
    let pad = control(PAD)?;

    let mut ids = Vec::with_capacity(ipa.len() * 2 + 3);
    let mut skipped = 0;
    ids.extend_from_slice(&bos);
    ids.extend_from_slice(&pad);

    let mut key = String::with_capacity(4);
    for ch in ipa.chars() {
        key.clear();
        key.push(ch);
        match id_map.get(&key) {
            Some(mapped) => {
                ids.extend_from_slice(mapped);
                ids.extend_from_slice(&pad);
            }
            None => skipped += 1,
        }
    }

    ids.extend_from_slice(&eos);
    Ok((ids, skipped))
}

/// Normalize text before phonemization: ASCII quotes and dashes, no
/// markdown emphasis, single spaces.
pub fn normalize_text(text: &str) -> String {
    let replaced = text
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2014}', '\u{2013}'], ", ")
        .replace(['*', '#', '`'], "");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into sentences at `.`, `!`, `?` followed by whitespace.
///
/// Each sentence is synthesized separately to keep inference inputs short.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?')
            && chars.peek().is_some_and(|(_, next)| next.is_whitespace())
        {
            let end = idx + ch.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}
