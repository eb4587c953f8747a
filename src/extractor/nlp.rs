//! Lightweight keyword and summary extraction over article text.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

pub const KEYWORD_COUNT: usize = 10;
pub const SUMMARY_SENTENCES: usize = 5;

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}\p{N}']+").unwrap());
static SENTENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?\n]+(?:[.!?]+|$)").unwrap());

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    "a about above after again against all also am an and any are aren't as at be because been \
     before being below between both but by can could did didn't do does doesn't doing don't down \
     during each few for from further had has have having he her here hers herself him himself his \
     how i if in into is isn't it it's its itself just me more most my myself no nor not now of off \
     on once only or other our ours ourselves out over own said same says she should so some such \
     than that that's the their theirs them themselves then there these they this those through to \
     too under until up very was wasn't we were what when where which while who whom why will with \
     would you your yours yourself yourselves one two new like get told according mr mrs ms"
        .split_whitespace()
        .collect()
});

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() > 2 && !STOPWORDS.contains(w.as_str()))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
}

fn frequencies(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in tokens(text) {
        *counts.entry(word).or_insert(0) += 1;
    }
    counts
}

/// Most frequent content words, ties broken alphabetically so output is stable.
pub fn keywords(text: &str) -> Vec<String> {
    let mut ranked: Vec<(String, usize)> = frequencies(text).into_iter().collect();
    ranked.sort_by(|(a, ca), (b, cb)| cb.cmp(ca).then_with(|| a.cmp(b)));
    ranked
        .into_iter()
        .take(KEYWORD_COUNT)
        .map(|(word, _)| word)
        .collect()
}

/// Pick the highest scoring sentences and emit them in document order.
pub fn summarize(title: &str, text: &str) -> String {
    let sentences: Vec<&str> = SENTENCE_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| s.split_whitespace().count() >= 4)
        .collect();
    if sentences.is_empty() {
        return String::new();
    }

    let top: HashSet<String> = keywords(text).into_iter().collect();
    let title_words: HashSet<String> = tokens(title).collect();
    let total = sentences.len() as f64;

    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| {
            let words: Vec<String> = tokens(sentence).collect();
            let len = words.len().max(1) as f64;
            let keyword_hits = words.iter().filter(|w| top.contains(*w)).count() as f64;
            let title_hits = words.iter().filter(|w| title_words.contains(*w)).count() as f64;
            let position = 1.0 - (index as f64 / total);
            let title_score = if title_words.is_empty() {
                0.0
            } else {
                title_hits / title_words.len() as f64
            };
            (index, keyword_hits / len + title_score + 0.5 * position)
        })
        .collect();

    scored.sort_by(|(ia, a), (ib, b)| b.total_cmp(a).then_with(|| ia.cmp(ib)));
    let mut chosen: Vec<usize> = scored
        .into_iter()
        .take(SUMMARY_SENTENCES)
        .map(|(index, _)| index)
        .collect();
    chosen.sort_unstable();

    chosen
        .into_iter()
        .map(|index| sentences[index])
        .collect::<Vec<_>>()
        .join("\n")
}
