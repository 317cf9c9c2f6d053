// src/notify/render.rs
//! Digest body rendering (plain text + HTML).

use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;

use crate::ingest::types::TrendItem;

const STYLE: &str = "body{font-family:Arial,sans-serif;margin:20px}\
.header{background:#f4f4f4;padding:20px;border-radius:5px}\
.item{margin:20px 0;padding:15px;border-left:4px solid #007acc;background:#f9f9f9}\
.title{color:#333;font-size:16px;margin-bottom:5px}\
.source{color:#666;font-size:12px}\
.points{color:#007acc;font-weight:bold}\
a{color:#007acc;text-decoration:none}";

pub struct Digest<'a> {
    items: &'a [TrendItem],
    date: NaiveDate,
}

impl<'a> Digest<'a> {
    pub fn new(items: &'a [TrendItem], date: NaiveDate) -> Self {
        Self { items, date }
    }

    fn date_str(&self) -> String {
        self.date.format("%B %d, %Y").to_string()
    }

    pub fn subject(&self) -> String {
        format!("Daily AI/ML Tech Trends - {}", self.date_str())
    }

    pub fn to_plain(&self) -> String {
        let mut out = format!("Daily AI/ML Tech Trends - {}\n\n", self.date_str());
        for (i, it) in self.items.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, it.title());
            let _ = writeln!(out, "   {}", it.url());
            if it.popularity() > 0 {
                let _ = writeln!(out, "   Source: {} | {} points", it.source_label(), it.popularity());
            } else {
                let _ = writeln!(out, "   Source: {}", it.source_label());
            }
            out.push('\n');
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(1024 + self.items.len() * 256);
        let _ = write!(
            out,
            "<html><head><meta charset=\"utf-8\"><style>{STYLE}</style></head><body>\
<div class=\"header\"><h1>Daily AI/ML Tech Trends</h1>\
<p>The latest in AI, Machine Learning and Data Science</p>\
<p><strong>Date:</strong> {}</p></div>",
            encode_text(&self.date_str())
        );

        for (i, it) in self.items.iter().enumerate() {
            let points = if it.popularity() > 0 {
                format!(" <span class=\"points\">&#9733; {}</span>", it.popularity())
            } else {
                String::new()
            };
            let _ = write!(
                out,
                "<div class=\"item\"><div class=\"title\"><strong>{n}. <a href=\"{href}\" target=\"_blank\">{title}</a></strong></div>\
<div class=\"source\">Source: {source}{points}</div></div>",
                n = i + 1,
                href = encode_double_quoted_attribute(it.url()),
                title = encode_text(it.title()),
                source = encode_text(it.source_label()),
            );
        }

        out.push_str(
            "<div class=\"header\" style=\"margin-top:30px\">\
<p><em>Generated automatically by tech-trends-digest.</em></p></div></body></html>",
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 6).unwrap()
    }

    #[test]
    fn subject_has_long_date() {
        let d = Digest::new(&[], date());
        assert_eq!(d.subject(), "Daily AI/ML Tech Trends - September 06, 2025");
    }

    #[test]
    fn html_escapes_titles_and_urls() {
        let items = vec![TrendItem::new(
            "<script>alert(1)</script> & co",
            "https://x.test/?a=1&b=\"2\"",
            3,
            "Hacker News",
        )
        .unwrap()];
        let html = Digest::new(&items, date()).to_html();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp; co"));
        assert!(!html.contains("b=\"2\""));
    }

    #[test]
    fn popularity_only_shown_when_positive() {
        let items = vec![
            TrendItem::new("Starred", "https://g.test/a", 42, "GitHub").unwrap(),
            TrendItem::new("Paper", "http://arxiv.org/abs/1", 0, "arXiv").unwrap(),
        ];
        let plain = Digest::new(&items, date()).to_plain();
        assert!(plain.contains("1. Starred"));
        assert!(plain.contains("Source: GitHub | 42 points"));
        assert!(plain.contains("2. Paper"));
        assert!(plain.contains("Source: arXiv\n"));

        let html = Digest::new(&items, date()).to_html();
        assert_eq!(html.matches("class=\"points\"").count(), 1);
    }
}
