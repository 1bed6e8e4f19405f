// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// The hot paths that run on every iteration or every history request:
//   1. Reply scraping — title, outline and score extraction
//   2. Prompt rendering — minijinja templates over long drafts
//   3. Record format — header render and parse for history listings
//   4. Cover style detection and markdown publishing

use chrono::Local;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use autodraft::core::extract::{extract_outline, extract_title, parse_score};
use autodraft::cover::CoverStyle;
use autodraft::pipeline::prompts::PromptSet;
use autodraft::publish::markdown_to_html;
use autodraft::store::record::{parse_header, render_record};

// ─── Helpers ────────────────────────────────────────────────────────────────

/// A draft of roughly `paragraphs` * 120 characters.
fn build_draft(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                "## 第{}部分\n\n我们总以为讨好别人就能换来认可，其实很多时候只是把自己弄丢了。\
                 说到底，关系里最重要的是边界，而不是一味地退让。第{}段。\n",
                i, i
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const TOPIC_REPLY: &str = "好的，下面是选题：\n\n标题：《别再讨好了：成年人的关系课》\n\n大纲：\n一、为什么我们总在讨好\n二、讨好的代价\n三、如何建立边界\n\n希望对你有帮助。";

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");

    group.bench_function("extract_title", |b| {
        b.iter(|| extract_title(black_box(TOPIC_REPLY)))
    });

    group.bench_function("extract_outline", |b| {
        b.iter(|| extract_outline(black_box(TOPIC_REPLY)))
    });

    group.bench_function("parse_score_bare", |b| {
        b.iter(|| parse_score(black_box("35")))
    });

    group.bench_function("parse_score_chatty", |b| {
        b.iter(|| parse_score(black_box("经过分析，我认为这篇文章的AI浓度约为 72%，主要原因是句式过于工整。")))
    });

    group.finish();
}

fn bench_prompts(c: &mut Criterion) {
    let prompts = PromptSet::default();
    let draft = build_draft(40);
    let mut group = c.benchmark_group("prompts");

    group.bench_function("render_topic", |b| {
        b.iter(|| prompts.topic(black_box("情感")).unwrap())
    });

    group.bench_function("render_score_truncated", |b| {
        b.iter(|| prompts.score(black_box(&draft)).unwrap())
    });

    group.bench_function("render_rewrite_long", |b| {
        b.iter(|| prompts.rewrite(black_box(&draft), Some(65)).unwrap())
    });

    group.finish();
}

fn bench_record(c: &mut Criterion) {
    let body = build_draft(20);
    let now = Local::now();
    let record = render_record(
        "别再讨好了",
        28,
        "Zhipu GLM-4",
        &now,
        Some("cover_20260101_120000.png"),
        &body,
    );
    let legacy = format!(
        "# 别再讨好了\n\n**Provider**: Gemini Web\n**AI Score**: 42%\n\n---\n\n{}",
        body
    );
    let mut group = c.benchmark_group("record");

    group.bench_function("render_record", |b| {
        b.iter(|| {
            render_record(
                black_box("别再讨好了"),
                28,
                "Zhipu GLM-4",
                &now,
                None,
                black_box(&body),
            )
        })
    });

    group.bench_function("parse_header", |b| {
        b.iter(|| parse_header(black_box(&record)))
    });

    group.bench_function("parse_header_legacy", |b| {
        b.iter(|| parse_header(black_box(&legacy)))
    });

    group.finish();
}

fn bench_cover_and_publish(c: &mut Criterion) {
    let draft = build_draft(40);
    let mut group = c.benchmark_group("cover_publish");

    group.bench_function("auto_select_style", |b| {
        b.iter(|| CoverStyle::auto_select(black_box(&draft)))
    });

    group.bench_function("markdown_to_html", |b| {
        b.iter(|| markdown_to_html(black_box(&draft)))
    });

    group.finish();
}

// ─── Main ───────────────────────────────────────────────────────────────────

criterion_group!(
    benches,
    bench_extract,
    bench_prompts,
    bench_record,
    bench_cover_and_publish,
);
criterion_main!(benches);
