use whatlang::{Lang, detect};

const MIN_CONFIDENCE: f64 = 0.25;
const MIN_TEXT_LENGTH: usize = 50;

/// Prefer the language the page declares; fall back to detecting it from the text.
pub fn resolve_language(declared: Option<&str>, text: &str) -> Option<String> {
    declared
        .and_then(normalize_declared)
        .or_else(|| detect_language(text))
}

/// `en-US`, `en_GB` and `EN` all become `en`.
fn normalize_declared(raw: &str) -> Option<String> {
    let primary = raw
        .trim()
        .split(['-', '_'])
        .next()?
        .to_ascii_lowercase();
    (primary.len() == 2 && primary.chars().all(|c| c.is_ascii_alphabetic())).then_some(primary)
}

pub fn detect_language(text: &str) -> Option<String> {
    if text.trim().len() < MIN_TEXT_LENGTH {
        return None;
    }

    let info = detect(text)?;
    (info.confidence() >= MIN_CONFIDENCE).then(|| lang_to_code(info.lang()))
}

fn lang_to_code(lang: Lang) -> String {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Rus => "ru",
        Lang::Cmn => "zh",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Tur => "tr",
        Lang::Swe => "sv",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        other => return other.code().to_string(),
    };
    code.to_string()
}
