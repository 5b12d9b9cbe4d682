//! 从文章正文（HTML 或纯文本）生成列表页使用的预览摘要。
//!
//! 截断策略按优先级依次尝试：句末标点 → 逗号/分号 → 单词边界 → 硬截断。
//! 所有长度与位置均按字符计数。

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

pub const DEFAULT_MAX_LENGTH: usize = 200;
pub const DEFAULT_MIN_LENGTH: usize = 50;

const ELLIPSIS: &str = "...";

/// 断点标记，按优先级排列。截断位置紧跟在标点之后，标点后的空格不保留
const BOUNDARY_INDICATORS: [&str; 8] = [". ", "! ", "? ", ".", "!", "?", ", ", "; "];

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static ABBREVIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof|Sr|Jr)\.$").unwrap());
static FIRST_PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p(?:\s[^>]*)?>(.*?)</p>").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExcerptOptions {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// 断点位置必须严格大于该值才会被采用
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// 优先使用第一个 `<p>` 段落作为摘要来源（由 `content::preview_text` 处理）
    #[serde(default)]
    pub preserve_paragraphs: bool,
}

fn default_max_length() -> usize { DEFAULT_MAX_LENGTH }
fn default_min_length() -> usize { DEFAULT_MIN_LENGTH }

impl Default for ExcerptOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
            preserve_paragraphs: false,
        }
    }
}

/// 标签替换为空格，再压缩连续空白并去掉首尾空白
pub fn clean_content(content: &str) -> String {
    let stripped = TAG_RE.replace_all(content, " ");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// 生成摘要。`options.preserve_paragraphs` 在这里不生效
pub fn generate_excerpt(content: &str, options: &ExcerptOptions) -> String {
    if content.is_empty() {
        return String::new();
    }

    let cleaned = clean_content(content);
    if cleaned.chars().count() <= options.max_length {
        return cleaned;
    }

    let window = char_prefix(&cleaned, options.max_length);

    cut_at_boundary(window, options.min_length)
        .or_else(|| cut_at_word(window, options.min_length))
        .unwrap_or_else(|| format!("{window}{ELLIPSIS}"))
}

/// 优先取第一个段落的文本；没有段落时退回到整个 HTML 上生成
pub fn generate_excerpt_from_html(
    html: &str,
    max_length: usize,
    preserve_first_paragraph: bool,
) -> String {
    let options = ExcerptOptions {
        max_length,
        ..ExcerptOptions::default()
    };

    if preserve_first_paragraph
        && let Some(caps) = FIRST_PARAGRAPH_RE.captures(html)
    {
        let inner = TAG_RE.replace_all(&caps[1], "");
        let paragraph = WHITESPACE_RE.replace_all(&inner, " ").trim().to_string();

        if paragraph.chars().count() <= max_length {
            return paragraph;
        }
        return generate_excerpt(&paragraph, &options);
    }

    generate_excerpt(html, &options)
}

/// 前 n 个字符
fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn char_position(s: &str, byte_pos: usize) -> usize {
    s[..byte_pos].chars().count()
}

/// 每种标记只看最后一次出现；被缩写规则否决时直接尝试下一种标记
fn cut_at_boundary(window: &str, min_length: usize) -> Option<String> {
    BOUNDARY_INDICATORS.iter().find_map(|indicator| {
        let pos = window.rfind(indicator)?;
        if char_position(window, pos) <= min_length {
            return None;
        }

        // 标记首字符均为单字节 ASCII 标点
        let excerpt = &window[..pos + 1];
        if ABBREVIATION_RE.is_match(excerpt) {
            return None;
        }
        Some(excerpt.to_string())
    })
}

fn cut_at_word(window: &str, min_length: usize) -> Option<String> {
    let pos = window.rfind(' ')?;
    (char_position(window, pos) > min_length).then(|| format!("{}{ELLIPSIS}", &window[..pos]))
}
