//! Length and engagement checks for a draft post on X/Twitter.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

pub const CHAR_LIMIT_FREE: usize = 280;
pub const CHAR_LIMIT_PREMIUM: usize = 25_000;
pub const OPTIMAL_RANGE: (usize, usize) = (71, 100);

const CALLS_TO_ACTION: &[&str] = &[
    "bookmark",
    "save",
    "retweet",
    "rt",
    "share",
    "follow",
    "click",
    "check out",
    "learn more",
    "read",
    "watch",
    "join",
    "subscribe",
    "sign up",
    "download",
    "try",
    "comment",
    "reply",
    "tag",
    "dm me",
];

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\w+").expect("valid regex"))
}

fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@\w+").expect("valid regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\\(\\),]",
            r"|(?:%[0-9a-fA-F][0-9a-fA-F]))+"
        ))
        .expect("valid regex")
    })
}

fn emoji_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            "[",
            r"\x{1F600}-\x{1F64F}",
            r"\x{1F300}-\x{1F5FF}",
            r"\x{1F680}-\x{1F6FF}",
            r"\x{1F1E0}-\x{1F1FF}",
            r"\x{2702}-\x{27B0}",
            r"\x{24C2}-\x{1F251}",
            "]+"
        ))
        .expect("valid regex")
    })
}

fn find_all(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub character_count: usize,
    pub character_limit: usize,
    pub remaining_chars: i64,
    pub is_within_limit: bool,
    pub is_optimal_length: bool,
    pub optimal_range: (usize, usize),
    pub word_count: usize,
    pub line_count: usize,
    pub hashtag_count: usize,
    pub hashtags: Vec<String>,
    pub mention_count: usize,
    pub mentions: Vec<String>,
    pub url_count: usize,
    pub urls: Vec<String>,
    pub has_question: bool,
    pub has_emoji: bool,
    pub suggestions: Vec<String>,
}

pub struct TweetAnalyzer<'a> {
    text: &'a str,
    premium: bool,
    char_count: usize,
    char_limit: usize,
}

impl<'a> TweetAnalyzer<'a> {
    pub fn new(text: &'a str, premium: bool) -> Self {
        Self {
            text,
            premium,
            char_count: text.chars().count(),
            char_limit: if premium {
                CHAR_LIMIT_PREMIUM
            } else {
                CHAR_LIMIT_FREE
            },
        }
    }

    pub fn analyze(&self) -> Analysis {
        let hashtags = find_all(hashtag_re(), self.text);
        let mentions = find_all(mention_re(), self.text);
        let urls = find_all(url_re(), self.text);
        let suggestions = self.suggestions(hashtags.len(), urls.len());
        Analysis {
            character_count: self.char_count,
            character_limit: self.char_limit,
            remaining_chars: self.char_limit as i64 - self.char_count as i64,
            is_within_limit: self.char_count <= self.char_limit,
            is_optimal_length: (OPTIMAL_RANGE.0..=OPTIMAL_RANGE.1).contains(&self.char_count),
            optimal_range: OPTIMAL_RANGE,
            word_count: self.text.split_whitespace().count(),
            line_count: self.text.split('\n').count(),
            hashtag_count: hashtags.len(),
            hashtags,
            mention_count: mentions.len(),
            mentions,
            url_count: urls.len(),
            urls,
            has_question: self.has_question(),
            has_emoji: emoji_re().is_match(self.text),
            suggestions,
        }
    }

    fn has_question(&self) -> bool {
        self.text.contains('?')
    }

    fn has_call_to_action(&self) -> bool {
        let lower = self.text.to_lowercase();
        CALLS_TO_ACTION.iter().any(|cta| lower.contains(cta))
    }

    fn suggestions(&self, hashtags: usize, urls: usize) -> Vec<String> {
        let (low, high) = OPTIMAL_RANGE;
        let count = self.char_count;
        let mut out = Vec::new();

        if count > self.char_limit {
            out.push(format!(
                "❌ Tweet exceeds {} character limit by {} characters",
                self.char_limit,
                count - self.char_limit
            ));
        } else if count < low {
            out.push(format!(
                "💡 Tweet is short ({count} chars). Consider expanding to {low}-{high} chars for 17% higher engagement"
            ));
        } else if count > high && !self.premium {
            out.push(format!(
                "💡 Tweet is longer than optimal ({count} chars). Consider shortening to {low}-{high} chars or converting to a thread"
            ));
        } else {
            out.push("✅ Tweet length is in the optimal range for engagement!".to_string());
        }

        if hashtags > 3 {
            out.push(format!(
                "⚠️ Using {hashtags} hashtags. Recommended: 2-3 max for clean appearance"
            ));
        } else if hashtags == 0 {
            out.push("💡 Consider adding 1-2 relevant hashtags for discoverability".to_string());
        }

        if !self.has_question() && !self.has_call_to_action() {
            out.push(
                "💡 Consider adding a question or call-to-action to boost engagement".to_string(),
            );
        }

        if urls > 1 {
            out.push(format!(
                "⚠️ Multiple URLs detected ({urls}). Consider using a single link for clarity"
            ));
        }
        out
    }
}

fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("'{i}'")).collect();
    format!("[{}]", quoted.join(", "))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "✅ Yes"
    } else {
        "❌ No"
    }
}

/// Human-readable report for the terminal.
pub fn format_report(analysis: &Analysis) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();
    let _ = writeln!(out, "\n{rule}\nTWEET ANALYSIS\n{rule}");

    let _ = writeln!(out, "\n📊 Character Metrics:");
    let _ = writeln!(
        out,
        "   Characters: {}/{}",
        analysis.character_count, analysis.character_limit
    );
    let _ = writeln!(out, "   Remaining: {}", analysis.remaining_chars);
    let _ = writeln!(
        out,
        "   Optimal range: {}-{} (current: {})",
        analysis.optimal_range.0, analysis.optimal_range.1, analysis.character_count
    );
    if analysis.is_optimal_length {
        let _ = writeln!(out, "   ✅ In optimal range for engagement!");
    }

    let _ = writeln!(out, "\n📝 Content Metrics:");
    let _ = writeln!(out, "   Words: {}", analysis.word_count);
    let _ = writeln!(out, "   Lines: {}", analysis.line_count);
    let _ = writeln!(
        out,
        "   Hashtags: {} {}",
        analysis.hashtag_count,
        quoted_list(&analysis.hashtags)
    );
    let _ = writeln!(
        out,
        "   Mentions: {} {}",
        analysis.mention_count,
        quoted_list(&analysis.mentions)
    );
    let _ = writeln!(out, "   URLs: {}", analysis.url_count);

    let _ = writeln!(out, "\n🎯 Engagement Indicators:");
    let _ = writeln!(out, "   Has question: {}", yes_no(analysis.has_question));
    let _ = writeln!(out, "   Has emoji: {}", yes_no(analysis.has_emoji));

    let _ = writeln!(out, "\n💡 Suggestions:");
    for suggestion in &analysis.suggestions {
        let _ = writeln!(out, "   {suggestion}");
    }
    let _ = writeln!(out, "\n{rule}");
    out
}
