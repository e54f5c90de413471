// Copyright © 2024 PostFlow. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Prompt construction for the two generation calls: picking a fresh
//! topic and writing a full post.

use std::fmt::Write as _;

use crate::core::config::Config;
use crate::core::traits::CompletionRequest;
use crate::ledger::LedgerEntry;
use crate::pages::SitePageDirectory;

/// Used topics listed as exclusions when asking for a fresh topic.
pub const TOPIC_HISTORY_LIMIT: usize = 30;
/// Recent posts offered as cross-link candidates.
pub const CROSS_LINK_LIMIT: usize = 10;

const TOPIC_TEMPERATURE: f32 = 0.9;
const TOPIC_MAX_TOKENS: u32 = 100;
const POST_TEMPERATURE: f32 = 0.7;
const POST_MAX_TOKENS: u32 = 4000;

/// Request for a single new topic that avoids `used_topics`.
pub fn topic_request(config: &Config, used_topics: &[&str]) -> CompletionRequest {
    let system = format!(
        "You are an SEO content strategist for {name}, {business} in {location}. \
         Generate practical, searchable blog topics that customers actually search for. \
         Mix between these types: \
         1) Problem-solving content ('how to fix...', 'what causes...', 'signs of...') \
         2) Service-focused content that explains what causes people to need specific services{services} \
         3) Company/trust content about why to choose a licensed professional, what to expect \
         during a service call, real customer scenarios. \
         Topics should naturally lead readers toward needing professional help.",
        name = config.site_name,
        business = config.business_description,
        location = config.site_location,
        services = if config.services.is_empty() {
            String::new()
        } else {
            format!(" such as {}", config.services.join(", "))
        },
    );

    let used = if used_topics.is_empty() {
        "None yet".to_string()
    } else {
        used_topics
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let user = format!(
        "Generate ONE unique blog topic. It must NOT overlap with these already-used topics:\n\
         {used}\n\nReturn ONLY the topic title, nothing else."
    );

    CompletionRequest::new(system, user)
        .with_temperature(TOPIC_TEMPERATURE)
        .with_max_tokens(TOPIC_MAX_TOKENS)
}

/// The internal-linking section: every site page, then the recent posts.
pub fn internal_links_context(
    pages: &SitePageDirectory,
    recent: &[(String, String)],
) -> String {
    let mut section = String::from(
        "INTERNAL SITE PAGES (you MUST link to at least 3 of these within the article):\n",
    );
    let lines: Vec<String> = pages
        .iter()
        .map(|page| {
            format!(
                "  - {}: URL=\"{}\" | Use when: {} | Example anchor: \"{}\"",
                page.id,
                page.url,
                page.use_when,
                page.anchors.first().map_or("", String::as_str)
            )
        })
        .collect();
    section.push_str(&lines.join("\n"));

    if !recent.is_empty() {
        section.push_str(
            "\n\nEXISTING BLOG POSTS (link to 1-3 related posts where relevant):\n",
        );
        let posts: Vec<String> = recent
            .iter()
            .map(|(title, url)| format!("  - \"{title}\" -> URL=\"{url}\""))
            .collect();
        section.push_str(&posts.join("\n"));
    }
    section
}

/// Request for a complete post on `topic`.
///
/// `recent` holds the cross-link candidates; `post_url` maps a slug to
/// its URL as seen from a post page.
pub fn post_request(
    config: &Config,
    pages: &SitePageDirectory,
    topic: &str,
    recent: &[LedgerEntry],
    post_url: impl Fn(&str) -> String,
) -> CompletionRequest {
    let candidates: Vec<(String, String)> = recent
        .iter()
        .take(CROSS_LINK_LIMIT)
        .map(|e| (e.title.clone(), post_url(&e.slug)))
        .collect();
    let links = internal_links_context(pages, &candidates);
    let contact_url = pages
        .get(&config.contact_page)
        .map_or("../contact.html", |p| p.url.as_str());

    let mut company = format!(
        "- Name: {}\n- Phone: {}\n- Location: {}\n",
        config.site_name, config.site_phone, config.site_location
    );
    if !config.services.is_empty() {
        let _ = writeln!(company, "- Services: {}", config.services.join(", "));
    }
    if !config.highlights.is_empty() {
        let _ = writeln!(company, "- Highlights: {}", config.highlights.join(", "));
    }

    let name = &config.site_name;
    let phone = &config.site_phone;
    let location = &config.site_location;
    let categories = config.categories.join(" | ");

    let user = format!(
        r#"Write a high-quality, SEO-optimized blog post for "{name}", {business} in {location}.

TOPIC: {topic}

COMPANY INFO:
{company}
{links}

Return your response as valid JSON with these exact keys:
{{
    "title": "SEO-optimized blog post title (include location or service keyword, 55-65 chars)",
    "meta_description": "Compelling meta description with keyword and CTA (under 155 characters)",
    "keywords": "comma-separated long-tail SEO keywords (6-10 keywords targeting what people search)",
    "excerpt": "2-sentence hook for the blog card that makes the reader want to click",
    "category": "One category: {categories}",
    "content": "The full blog post body as HTML markup (see requirements below)"
}}

CRITICAL REQUIREMENTS for the "content" field:

CONTENT QUALITY:
- Write 1000-1500 words of genuinely helpful, practical content
- Start with a hook paragraph that addresses the reader's pain point directly
- Be helpful, not salesy; make it clear when professional help is needed
- Include specific details (measurements, timeframes, cost ranges) to build authority
- Mention {location} naturally 2-3 times for local SEO

STRUCTURE:
- Use <h2> for main sections (4-6 sections), <h3> for subsections where needed
- Include at least 2 bulleted/numbered lists with <ul>/<li> or <ol>/<li>
- Use <strong> for key terms and important warnings
- NO <h1> tag (handled by template), NO <html>/<head>/<body> wrappers

INTERNAL LINKING (MANDATORY):
- Include at least 3 links to distinct site pages above using <a href="URL">descriptive anchor text</a>
- Link to 1-3 related existing blog posts when any are listed above
- Use descriptive anchor text (not "click here") woven naturally into sentences

CALL-TO-ACTION:
- Include one subtle mid-article CTA linking to <a href="{contact_url}">the contact page</a>
- End with a closing CTA paragraph naming {name}, the phone number {phone}, and linking to {contact_url}

SEO:
- Use the target keyword naturally in the first paragraph
- Include semantic variations and related terms throughout
- Structure content to earn featured snippets (lists, direct answers to questions)"#,
        business = config.business_description,
    );

    let system = "You are an expert content writer and SEO specialist. \
        You write authoritative, genuinely helpful blog posts that rank well \
        and convert readers into customers. You always include internal links \
        to the company's website pages. \
        Always respond with valid JSON only, no markdown code fences, just raw JSON.";

    CompletionRequest::new(system, user)
        .with_temperature(POST_TEMPERATURE)
        .with_max_tokens(POST_MAX_TOKENS)
        .with_json_response(true)
}
