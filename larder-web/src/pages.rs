//! Shared page chrome
//!
//! Every HTML page goes through [`layout`], which adds the navigation bar and
//! the pending flash messages. Anything user-supplied must pass through
//! [`escape`] before it is interpolated.

use crate::session::Flash;

pub use larder_common::html::escape;

fn render_flashes(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="flash flash-{}">{}</div>"#,
                f.level.as_str(),
                escape(&f.message)
            )
        })
        .collect()
}

fn render_nav(user: Option<&str>) -> String {
    match user {
        Some(user) => format!(
            r#"<nav>
    <a href="/home">Home</a>
    <a href="/add">Add</a>
    <a href="/taking">Take</a>
    <a href="/shoppinglist">Shopping list</a>
    <a href="/recipe">Recipes</a>
    <a href="/notes">Notes</a>
    <span class="nav-user">{user}</span>
    <a href="/change">Change password</a>
    <a href="/logout">Log out</a>
</nav>"#,
            user = escape(user)
        ),
        None => String::from(
            r#"<nav><a href="/">Log in</a> <a href="/signup">Sign up</a></nav>"#,
        ),
    }
}

/// Wrap `body` in the common document structure
pub fn layout(title: &str, user: Option<&str>, flashes: &[Flash], body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Larder</title>
    <link rel="stylesheet" href="/static/larder.css">
</head>
<body>
<header>
    <h1>Larder</h1>
    {nav}
</header>
<main class="container">
{flashes}
{body}
</main>
</body>
</html>"#,
        title = escape(title),
        nav = render_nav(user),
        flashes = render_flashes(flashes),
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FlashLevel;

    #[test]
    fn test_layout_escapes_flashes() {
        let flashes = vec![Flash {
            level: FlashLevel::Error,
            message: "Ingredient <script> not found".to_string(),
        }];
        let html = layout("Home", Some("cook@example.com"), &flashes, "<p>body</p>");
        assert!(html.contains(r#"class="flash flash-error""#));
        assert!(html.contains("Ingredient &lt;script&gt; not found"));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("/logout"));
    }
}
