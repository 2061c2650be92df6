//! Chinese prompt family.

use super::{EDIT_DIFF_LIMIT, GENERATION_DIFF_LIMIT, PromptSet, truncate_chars};
use crate::git::DiffSource;

pub static PROMPTS: PromptSet = PromptSet {
    generation: generation_prompt,
    edit: edit_prompt,
    managed: managed_prompt,
};

fn generation_prompt(diff: &str, stats: &str, multi_line: bool) -> String {
    let diff = truncate_chars(diff, GENERATION_DIFF_LIMIT);

    if multi_line {
        return format!(
            r#"分析 git 变更并生成符合 conventional commits 格式的详细 commit message。

变更统计：
{stats}

Diff（前 6000 个字符）：
{diff}

回复格式：
<type>(<scope>): <subject>

<body>

<footer>

规则：
- Subject：过去时态，最多 50 个字符，不加句号
- Body：详细描述变更内容（改了什么、为什么改）
- Footer：Breaking changes、issue 引用
- Type：feat/fix/refactor/docs/style/test/chore/perf
- 使用动词：添加了、修复了、更新了、删除了、重构了

示例：
feat(auth): 添加了 Google OAuth 登录

实现了通过 Google OAuth 2.0 的身份验证。
添加了令牌处理和刷新机制。
更新了配置以支持新的登录提供商。

Closes #123

仅返回指定格式的 commit message，不要有任何解释。"#
        );
    }

    format!(
        r#"分析 git 变更并生成符合 conventional commits 格式的 commit message。

变更统计：
{stats}

Diff（前 6000 个字符）：
{diff}

严格规则：
- 格式：<type>(<scope>): <subject>
- Type：feat/fix/refactor/docs/style/test/chore/perf
- Subject 使用过去时态（描述完成了什么），最多 50 个字符，不加句号
- 使用动词：添加了、修复了、更新了、删除了、重构了
- 错误示例："添加功能"、"修复 bug"、"更新样式"
- 正确示例："添加了功能"、"修复了 bug"、"更新了样式"

示例：
feat(auth): 添加了 Google OAuth 登录
fix(api): 修复了 user endpoint 的验证错误
refactor(store): 优化了购物车状态管理
docs(readme): 更新了安装说明

仅返回 commit message（一行），不要有任何解释。"#
    )
}

fn edit_prompt(current_message: &str, user_feedback: &str, diff: &str, stats: &str) -> String {
    let diff = truncate_chars(diff, EDIT_DIFF_LIMIT);

    format!(
        r#"当前 commit message：
{current_message}

用户反馈：
{user_feedback}

Git 变更：
{stats}

{diff}

根据用户反馈重新生成 commit message。
遵循 conventional commits 格式。
仅返回新的 commit message，不要有任何解释。"#
    )
}

fn managed_prompt(source: DiffSource, keep_co_authored_by: bool, custom: &str) -> String {
    let scope = match source {
        DiffSource::Staged => "仅考虑已暂存（staged）的改动。",
        DiffSource::All => "考虑工作区的所有改动。",
        DiffSource::Auto => "优先考虑已暂存的改动；如果没有暂存内容，则考虑所有改动。",
    };

    let mut prompt = format!(
        "为当前改动生成git commit message，使用中文。{scope}仅输出commit message内容，不要有其他多余输出。"
    );
    if !custom.is_empty() {
        prompt.push_str(&format!("\n\n额外要求：{custom}"));
    }
    if keep_co_authored_by {
        prompt.push_str(
            "\n\ncommit message 末尾保留:\n🤖 Generated with Claude Code\nCo-Authored-By: Claude <noreply@anthropic.com>",
        );
    }
    prompt
}
