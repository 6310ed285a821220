//! HTML views for stage pages and the error page.

use stagegate_core::content::escape_html;
use stagegate_core::{GateError, StagePage, StagePlan, ROOT_PATH};

/// Full page for the visitor's current stage, with the form that drives the
/// next transition.
pub fn stage_page(page: &StagePage, plan: &StagePlan, static_prefix: &str) -> String {
    let form = if page.stage == ROOT_PATH {
        register_form(&plan.register_endpoint)
    } else if page.stage == plan.registered {
        challenge_form(&plan.challenge_endpoint)
    } else {
        String::new()
    };

    let identity = match (page.name.as_deref(), page.passphrase.as_deref()) {
        (Some(name), Some(passphrase)) => format!(
            r#"<aside class="identity"><p class="name">{}</p><p class="passphrase">{}</p></aside>"#,
            escape_html(name),
            escape_html(passphrase)
        ),
        _ => String::new(),
    };

    layout(
        &strip_tags(&page.title),
        &format!(
            "<h1>{}</h1><section class=\"content\">{}</section>{}{}",
            page.title, page.body, form, identity
        ),
        static_prefix,
    )
}

/// Generic error page carrying the error kind label.
pub fn error_page(err: &GateError, static_prefix: &str) -> String {
    layout(
        "Something went wrong",
        &format!(
            r#"<h1>Something went wrong</h1><p class="error" data-kind="{label}">{message}</p><p class="kind">{label}</p>"#,
            label = err.label(),
            message = escape_html(&err.to_string()),
        ),
        static_prefix,
    )
}

fn register_form(action: &str) -> String {
    format!(
        r#"<form method="post" action="{}"><label for="name">Name</label><input id="name" name="name" type="text" required autofocus><button type="submit">Continue</button></form>"#,
        escape_html(action)
    )
}

fn challenge_form(action: &str) -> String {
    format!(
        r#"<form method="post" action="{}"><button name="answer" value="yes" type="submit">Yes</button><button name="answer" value="no" type="submit">No</button></form>"#,
        escape_html(action)
    )
}

fn layout(title: &str, main: &str, static_prefix: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
<link rel="stylesheet" href="{}/gate.css">
</head>
<body><main>{}</main></body>
</html>
"#,
        escape_html(title),
        escape_html(static_prefix.trim_end_matches('/')),
        main
    )
}

/// Text content of an HTML fragment, for the document title.
fn strip_tags(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.trim().to_string()
}
