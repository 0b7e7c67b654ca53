//! Markdown rendering of the archive and of single issues.
//!
//! Links between views use the hash routes from [`crate::router`], so the
//! output can be pasted into a page that understands them.

use std::fmt::{self, Write};

use clap::ValueEnum;

use crate::models::{Issue, Item, ResolvedImage};
use crate::router::Route;

/// Which language columns to print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Lang {
    Cn,
    En,
    #[default]
    Both,
}

impl Lang {
    fn cn(self) -> bool {
        matches!(self, Self::Cn | Self::Both)
    }

    fn en(self) -> bool {
        matches!(self, Self::En | Self::Both)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub lang: Lang,
    pub show_published_at: bool,
    pub show_captions: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            lang: Lang::Both,
            show_published_at: true,
            show_captions: true,
        }
    }
}

/// Archive list. `issues` should already be sorted for display.
pub fn archive_to_markdown(issues: &[Issue]) -> String {
    let mut out = String::new();
    let _ = write_archive(&mut out, issues);
    out
}

fn write_archive(out: &mut String, issues: &[Issue]) -> fmt::Result {
    writeln!(out, "# Weekly Digest Archive\n")?;
    if issues.is_empty() {
        writeln!(out, "_No issues yet._")?;
        return Ok(());
    }
    for issue in issues {
        writeln!(
            out,
            "- [{}]({}) · {} → {} · {} items",
            issue.display_title(),
            Route::Issue(issue.id.clone()).to_hash(),
            issue.start,
            issue.end,
            issue.items.len()
        )?;
    }
    Ok(())
}

/// One issue. `images[i]` is the image for `issue.items[i]`; `None` means the
/// image is hidden.
pub fn issue_to_markdown(
    issue: &Issue,
    images: &[Option<ResolvedImage>],
    opts: &RenderOptions,
) -> String {
    let mut out = String::new();
    let _ = write_issue(&mut out, issue, images, opts);
    out
}

fn write_issue(
    out: &mut String,
    issue: &Issue,
    images: &[Option<ResolvedImage>],
    opts: &RenderOptions,
) -> fmt::Result {
    writeln!(out, "# {}\n", issue.display_title())?;
    writeln!(out, "_{} → {}_", issue.start, issue.end)?;
    if opts.show_published_at {
        if let Some(ts) = issue.published_at() {
            writeln!(out, "\nPublished {}", ts.format("%Y-%m-%d %H:%M %:z"))?;
        }
    }
    writeln!(out)?;

    if let Some(cover) = issue.cover.as_ref().filter(|c| !c.src.trim().is_empty()) {
        writeln!(out, "![cover]({})\n", cover.src)?;
    }
    if opts.lang.en() {
        if let Some(s) = &issue.summary_en {
            writeln!(out, "{s}\n")?;
        }
    }
    if opts.lang.cn() {
        if let Some(s) = &issue.summary_cn {
            writeln!(out, "{s}\n")?;
        }
    }

    for (index, item) in issue.items.iter().enumerate() {
        let image = images.get(index).and_then(Option::as_ref);
        write_item(out, index + 1, item, image, opts)?;
    }

    writeln!(out, "[← Archive]({})", Route::Home.to_hash())
}

fn write_item(
    out: &mut String,
    number: usize,
    item: &Item,
    image: Option<&ResolvedImage>,
    opts: &RenderOptions,
) -> fmt::Result {
    writeln!(out, "## {number}. {}\n", item.title)?;

    if let Some(img) = image {
        let alt = item
            .image
            .as_ref()
            .and_then(|i| i.alt.as_deref())
            .unwrap_or(item.title.as_str());
        match &img.href {
            Some(href) => writeln!(out, "[![{alt}]({})]({href})", img.src)?,
            None => writeln!(out, "![{alt}]({})", img.src)?,
        }
        if opts.show_captions {
            let note: Vec<&str> = [img.caption.as_deref(), img.credit.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !note.is_empty() {
                writeln!(out, "_{}_", note.join(" · "))?;
            }
        }
        writeln!(out)?;
    }

    if let Some(info) = &item.key_info {
        let parts: Vec<String> = [
            ("Time (SGT)", &info.time_sgt),
            ("Actor", &info.actor),
            ("Market", &info.market),
            ("Impact", &info.impact),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("**{label}:** {v}")))
        .collect();
        if !parts.is_empty() {
            writeln!(out, "{}\n", parts.join(" | "))?;
        }
    }

    let facts = [
        (opts.lang.en(), &item.facts_en),
        (opts.lang.cn(), &item.facts_cn),
    ];
    for (enabled, list) in facts {
        if let (true, Some(list)) = (enabled, list) {
            for fact in list {
                writeln!(out, "- {fact}")?;
            }
            writeln!(out)?;
        }
    }

    if opts.lang.en() {
        if let Some(why) = &item.why_en {
            writeln!(out, "> Why it matters: {why}\n")?;
        }
    }
    if opts.lang.cn() {
        if let Some(why) = &item.why_cn {
            writeln!(out, "> 为何重要：{why}\n")?;
        }
    }

    if let Some(links) = item.links.as_ref().filter(|l| !l.is_empty()) {
        let rendered: Vec<String> = links
            .iter()
            .filter(|l| !l.url.trim().is_empty())
            .map(|l| format!("[{}]({})", l.label.as_deref().unwrap_or(l.url.as_str()), l.url))
            .collect();
        if !rendered.is_empty() {
            writeln!(out, "Sources: {}\n", rendered.join(", "))?;
        }
    }
    Ok(())
}
