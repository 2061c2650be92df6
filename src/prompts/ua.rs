//! Ukrainian prompt family.

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
            r#"Проаналізуй git зміни та згенеруй детальний commit message у форматі conventional commits.

Статистика змін:
{stats}

Diff (перші 6000 символів):
{diff}

ФОРМАТ ВІДПОВІДІ:
<type>(<scope>): <subject>

<body>

<footer>

ПРАВИЛА:
- Subject: МИНУЛИЙ ЧАС, макс 50 символів, без крапки
- Body: детальний опис змін (що і чому змінено)
- Footer: Breaking changes, issue references
- Type: feat/fix/refactor/docs/style/test/chore/perf
- Дієслова: додано, виправлено, оновлено, видалено, рефакторено

Приклад:
feat(auth): додано Google OAuth провайдер

Реалізовано аутентифікацію через Google OAuth 2.0.
Додано обробку токенів та refresh механізм.
Оновлено конфігурацію для підтримки нових провайдерів.

Closes #123

Поверни ТІЛЬКИ commit message у вказаному форматі, без пояснень."#
        );
    }

    format!(
        r#"Проаналізуй git зміни та згенеруй commit message у форматі conventional commits.

Статистика змін:
{stats}

Diff (перші 6000 символів):
{diff}

СУВОРІ ПРАВИЛА:
- Формат: <type>(<scope>): <subject>
- Type: feat/fix/refactor/docs/style/test/chore/perf
- Subject ТІЛЬКИ у МИНУЛОМУ ЧАСІ (що ЗРОБЛЕНО), макс 50 символів, без крапки
- Використовуй дієслова: додано, виправлено, оновлено, видалено, рефакторено
- НЕПРАВИЛЬНО: "додати функцію", "виправити баг", "оновити стилі"
- ПРАВИЛЬНО: "додано функцію", "виправлено баг", "оновлено стилі"

Приклади:
feat(auth): додано Google OAuth провайдер
fix(api): виправлено помилку валідації в user endpoint
refactor(store): оптимізовано управління станом корзини
docs(readme): оновлено інструкції встановлення

Поверни ТІЛЬКИ commit message (один рядок), без пояснень."#
    )
}

fn edit_prompt(current_message: &str, user_feedback: &str, diff: &str, stats: &str) -> String {
    let diff = truncate_chars(diff, EDIT_DIFF_LIMIT);

    format!(
        r#"Поточний commit message:
{current_message}

Відгук користувача:
{user_feedback}

Git зміни:
{stats}

{diff}

Перегенеруй commit message враховуючи відгук користувача.
Дотримуйся формату conventional commits.
Поверни ТІЛЬКИ новий commit message, без пояснень."#
    )
}

fn managed_prompt(source: DiffSource, keep_co_authored_by: bool, custom: &str) -> String {
    let scope = match source {
        DiffSource::Staged => "Враховуй лише staged зміни.",
        DiffSource::All => "Враховуй всі зміни в робочій директорії.",
        DiffSource::Auto => "Враховуй staged зміни; якщо їх немає, враховуй всі зміни.",
    };

    let mut prompt = format!(
        "Згенеруй git commit message для поточних змін українською мовою. {scope} Виведи ТІЛЬКИ commit message, без жодного іншого тексту."
    );
    if !custom.is_empty() {
        prompt.push_str(&format!("\n\nДодаткові вимоги: {custom}"));
    }
    if keep_co_authored_by {
        prompt.push_str(
            "\n\nЗалиш у кінці commit message:\n🤖 Generated with Claude Code\nCo-Authored-By: Claude <noreply@anthropic.com>",
        );
    }
    prompt
}
