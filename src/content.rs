pub mod excerpt;

pub use excerpt::ExcerptOptions;

/// 按配置为文章正文生成预览文本
pub fn preview_text(content: &str, options: &ExcerptOptions) -> String {
    if options.preserve_paragraphs {
        excerpt::generate_excerpt_from_html(content, options.max_length, true)
    } else {
        excerpt::generate_excerpt(content, options)
    }
}
