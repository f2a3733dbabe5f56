//! Keyword fast path for price lookups.
//!
//! Answers "chawal ka price kya hai" style questions straight from the
//! inventory without a provider round trip. Anything it does not recognise
//! gets a "please repeat" answer; it never escalates to the provider.

use serde::{Deserialize, Serialize};

use snapbill_core::snapshot::SnapshotItem;

const PRICE_KEYWORDS: &[&str] = &[
    "price", "prices", "rate", "cost", "how much", "kitna", "kitne", "kitni", "keemat", "kimat",
    "daam", "dam", "bhav", "भाव", "दाम", "कीमत", "कितना", "कितने",
];

const BILLING_KEYWORDS: &[&str] = &[
    "de do", "dedo", "de dijiye", "daal do", "dal do", "jod do", "likh do", "add", "add it",
    "give me", "chahiye", "दे दो", "डाल दो", "जोड़ दो",
];

const STOPWORDS: &[&str] = &[
    "ka", "ki", "ke", "kya", "hai", "hain", "kitna", "kitne", "kitni", "price", "prices", "rate",
    "cost", "keemat", "kimat", "daam", "dam", "bhav", "batao", "bataiye", "bata", "bhai", "bhaiya",
    "what", "is", "the", "of", "how", "much", "tell", "me", "please", "de", "do", "dedo", "dijiye",
    "jod", "likh", "add", "it", "give", "chahiye", "mujhe", "ek", "aur", "abhi",
    "का", "की", "के", "क्या", "है", "भाव", "दाम", "कीमत", "कितना", "कितने", "दे", "दो",
];

/// "daal do" is a verb phrase, but Dal is also an item; these are only
/// dropped when followed by "do".
const VERB_BEFORE_DO: &[&str] = &["daal", "dal", "डाल"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Query,
    Billing,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    /// Whether the capture loop should keep listening for a billing utterance.
    pub continuation: bool,
    pub mode: AnswerMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<SnapshotItem>,
}

impl QueryAnswer {
    fn query(answer: String) -> Self {
        Self { answer, continuation: false, mode: AnswerMode::Query, matched: None }
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueryClassifier;

impl QueryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// `inventory` is the full catalogue, unpriced items included.
    pub fn classify(&self, utterance: &str, inventory: &[SnapshotItem]) -> QueryAnswer {
        let tokens = tokenize(&normalize_text(utterance));
        let wants_price = has_keyword(&tokens, PRICE_KEYWORDS);
        let wants_billing = has_keyword(&tokens, BILLING_KEYWORDS);
        if !wants_price && !wants_billing {
            return repeat_answer();
        }

        let phrase = candidate_phrase(&tokens);
        if phrase.is_empty() {
            return repeat_answer();
        }

        let Some(item) = match_item(&phrase, inventory) else {
            return QueryAnswer::query(format!("'{phrase}' inventory mein nahi mila."));
        };

        if !item.is_priced() {
            let mut answer = QueryAnswer::query(format!(
                "{} ka price abhi set nahi hai. Pehle inventory mein price daaliye.",
                item.display_name()
            ));
            answer.matched = Some(item.clone());
            return answer;
        }

        let quoted = price_sentence(item);
        if wants_billing {
            QueryAnswer {
                answer: format!("{quoted} Kitna chahiye? Quantity boliye."),
                continuation: true,
                mode: AnswerMode::Billing,
                matched: Some(item.clone()),
            }
        } else {
            QueryAnswer {
                answer: quoted,
                continuation: false,
                mode: AnswerMode::Query,
                matched: Some(item.clone()),
            }
        }
    }
}

fn repeat_answer() -> QueryAnswer {
    QueryAnswer::query("Maaf kijiye, samajh nahi aaya. Kripya dobara boliye.".to_string())
}

fn price_sentence(item: &SnapshotItem) -> String {
    let price = format_amount(item.price);
    if item.unit.is_empty() {
        format!("{} ka price ₹{price} hai.", item.display_name())
    } else {
        format!("{} ka price ₹{price} per {} hai.", item.display_name(), item.unit)
    }
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|character: char| {
        character.is_whitespace() || character.is_ascii_punctuation() || character == '।'
    })
    .filter(|token| !token.is_empty())
    .map(ToString::to_string)
    .collect()
}

/// Single-word keywords match whole tokens; multi-word ones match a token run.
fn has_keyword(tokens: &[String], keywords: &[&str]) -> bool {
    let padded = format!(" {} ", tokens.join(" "));
    keywords.iter().any(|keyword| padded.contains(&format!(" {keyword} ")))
}

fn candidate_phrase(tokens: &[String]) -> String {
    tokens
        .iter()
        .enumerate()
        .filter(|(index, token)| {
            let verb = VERB_BEFORE_DO.contains(&token.as_str())
                && matches!(tokens.get(index + 1).map(String::as_str), Some("do" | "दो"));
            !verb && token.chars().count() > 1 && !STOPWORDS.contains(&token.as_str())
        })
        .map(|(_, token)| token.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn folded_names(item: &SnapshotItem) -> Vec<String> {
    item.names
        .iter()
        .map(|name| fold_spelling(&normalize_text(name.trim())))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Collapses doubled Latin vowels so Hinglish spellings meet: "daal" and
/// "dal", "cheeni" and "cheni".
fn fold_spelling(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    let mut previous = None;
    for character in text.chars() {
        let doubled_vowel = previous == Some(character) && "aeiou".contains(character);
        if !doubled_vowel {
            folded.push(character);
        }
        previous = Some(character);
    }
    folded
}

/// First item with a name containing the phrase, case-insensitively and
/// modulo doubled vowels. Failing
/// that, the item whose name is the longest one contained in the phrase, so
/// "mustard oil" never resolves to a plain "Oil" listed earlier.
fn match_item<'a>(phrase: &str, inventory: &'a [SnapshotItem]) -> Option<&'a SnapshotItem> {
    let phrase = fold_spelling(phrase);
    let phrase = phrase.as_str();

    if let Some(item) =
        inventory.iter().find(|item| folded_names(item).iter().any(|name| name.contains(phrase)))
    {
        return Some(item);
    }

    let mut best: Option<(&SnapshotItem, usize)> = None;
    for item in inventory {
        for name in folded_names(item) {
            let length = name.chars().count();
            if phrase.contains(&name) && best.map_or(true, |(_, longest)| length > longest) {
                best = Some((item, length));
            }
        }
    }
    best.map(|(item, _)| item)
}
