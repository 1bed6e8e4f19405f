// src/pipeline/prompts.rs — Prompt templates (minijinja)

use minijinja::{context, Environment};

use crate::infra::config::PromptsConfig;
use crate::infra::errors::DraftError;
use crate::util::truncate_str;

pub const TOPIC_TEMPLATE: &str = "\
作为公众号运营专家，请在 {{ domain }} 领域构思一个爆款选题。

要求：
1. 标题吸睛（不超过 30 字）
2. 有争议性或共鸣点
3. 给出简要大纲

格式：
标题：《XXX》
大纲：XXX";

/// Longer brief used when a separate model writes from the outline.
pub const RESEARCH_TOPIC_TEMPLATE: &str = "\
你是一位经验丰富的公众号文章编辑。请深度研究以下领域：

领域：{{ domain }}

请完成以下任务：
1. 深度分析这个领域的热点话题和用户痛点
2. 提出一个有吸引力、有争议性、能引发共鸣的文章标题
3. 设计详细的文章大纲（包含开头、3-5个主要部分、结尾）

请直接输出格式如下：
标题：《文章标题》

大纲：
一、开头
- 要点1

二、主体部分1
- 要点1
- 要点2

三、结尾
- 要点";

pub const DRAFT_TEMPLATE: &str = "\
请写一篇公众号文章：

标题：《{{ title }}》
{% if outline %}
大纲：
{{ outline }}
{% endif %}
要求：
1. 约 {{ length }} 字
2. 风格犀利、幽默、像人类
3. 多用短句
4. 加入个人观点
5. 避免AI常用词（如\"综上所述\"、\"首先其次\"）
6. 段落3-5句话换段
7. 有情感共鸣

请直接输出文章，不要输出标题，不要任何开场白。";

pub const SCORE_TEMPLATE: &str = "\
请评估以下文本的 AI 浓度（0-100分）：

文本：
{{ text }}

只需输出一个数字（0-100），不要解释。";

pub const REWRITE_TEMPLATE: &str = "\
请重写以下文本，使其更像真人写的{% if score is not none %}（当前 AI 浓度约 {{ score }}%）{% endif %}：

要求：
1. 增加口语化表达
2. 打乱句式结构
3. 加入个人观点和情感
4. 使用地道的中文
5. 避免\"综上所述\"、\"首先其次\"等 AI 用词

原文：
{{ text }}

请直接输出重写后的内容：";

/// The four prompts one pipeline needs.
#[derive(Debug, Clone)]
pub struct PromptSet {
    topic: String,
    draft: String,
    score: String,
    rewrite: String,
    article_length: u32,
    score_sample_chars: usize,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            topic: TOPIC_TEMPLATE.into(),
            draft: DRAFT_TEMPLATE.into(),
            score: SCORE_TEMPLATE.into(),
            rewrite: REWRITE_TEMPLATE.into(),
            article_length: 2000,
            score_sample_chars: 2000,
        }
    }
}

impl PromptSet {
    /// Defaults with the research-style topic brief.
    pub fn research() -> Self {
        Self {
            topic: RESEARCH_TOPIC_TEMPLATE.into(),
            ..Self::default()
        }
    }

    /// Apply configured overrides. Every template is compiled once here so
    /// syntax errors surface before a run starts.
    pub fn with_overrides(mut self, overrides: &PromptsConfig) -> Result<Self, DraftError> {
        if let Some(t) = &overrides.topic {
            self.topic = t.clone();
        }
        if let Some(t) = &overrides.draft {
            self.draft = t.clone();
        }
        if let Some(t) = &overrides.score {
            self.score = t.clone();
        }
        if let Some(t) = &overrides.rewrite {
            self.rewrite = t.clone();
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_lengths(mut self, article_length: u32, score_sample_chars: usize) -> Self {
        self.article_length = article_length;
        self.score_sample_chars = score_sample_chars;
        self
    }

    /// Effective template sources, overrides applied.
    pub fn templates(&self) -> PromptsConfig {
        PromptsConfig {
            topic: Some(self.topic.clone()),
            draft: Some(self.draft.clone()),
            score: Some(self.score.clone()),
            rewrite: Some(self.rewrite.clone()),
        }
    }

    fn validate(&self) -> Result<(), DraftError> {
        let env = Environment::new();
        for source in [&self.topic, &self.draft, &self.score, &self.rewrite] {
            env.template_from_str(source)?;
        }
        Ok(())
    }

    fn render(source: &str, ctx: minijinja::Value) -> Result<String, DraftError> {
        let env = Environment::new();
        Ok(env.render_str(source, ctx)?)
    }

    pub fn topic(&self, domain: &str) -> Result<String, DraftError> {
        Self::render(&self.topic, context! { domain })
    }

    pub fn draft(&self, title: &str, outline: &str) -> Result<String, DraftError> {
        Self::render(
            &self.draft,
            context! { title, outline, length => self.article_length },
        )
    }

    /// Only the leading `score_sample_chars` characters are judged.
    pub fn score(&self, text: &str) -> Result<String, DraftError> {
        let text = truncate_str(text, self.score_sample_chars);
        Self::render(&self.score, context! { text })
    }

    pub fn rewrite(&self, text: &str, score: Option<u8>) -> Result<String, DraftError> {
        Self::render(&self.rewrite, context! { text, score })
    }
}
