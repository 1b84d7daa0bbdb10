//! Views
//!
//! Markup-only page rendering. Handlers pick a view or a redirect; no
//! decisions are made here. All user-supplied text goes through
//! [`escape`].

use crate::domain::entity::user::User;

/// Escape text for HTML element and attribute context
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 40rem; margin: 3rem auto; padding: 0 1rem; color: #222; }}
nav a {{ margin-right: 1rem; }}
form {{ display: grid; gap: 0.75rem; max-width: 20rem; }}
input, button {{ padding: 0.5rem; font-size: 1rem; }}
.secret {{ border-left: 3px solid #888; padding: 0.5rem 1rem; margin: 1rem 0; }}
.providers a {{ display: inline-block; margin-right: 1rem; }}
</style>
</head>
<body>
<nav><a href="/">Home</a><a href="/secrets">Secrets</a><a href="/submit">Submit</a><a href="/logout">Log out</a></nav>
{body}
</body>
</html>
"#
    )
}

pub fn home() -> String {
    layout(
        "Secrets",
        r#"<h1>Whisper it</h1>
<p>Share a secret with the world, anonymously.</p>
<p><a href="/register">Register</a> or <a href="/login">log in</a> to share yours.</p>"#,
    )
}

pub fn register_form() -> String {
    layout(
        "Register",
        r#"<h1>Register</h1>
<form method="post" action="/register">
<input type="text" name="username" placeholder="Username" required>
<input type="password" name="password" placeholder="Password" required>
<button type="submit">Register</button>
</form>
<div class="providers">
<p>Or sign up with:</p>
<a href="/auth/google">Google</a>
<a href="/auth/facebook">Facebook</a>
</div>
<p>Already have an account? <a href="/login">Log in</a>.</p>"#,
    )
}

pub fn login_form() -> String {
    layout(
        "Log in",
        r#"<h1>Log in</h1>
<form method="post" action="/login">
<input type="text" name="username" placeholder="Username" required>
<input type="password" name="password" placeholder="Password" required>
<button type="submit">Log in</button>
</form>
<div class="providers">
<p>Or sign in with:</p>
<a href="/auth/google">Google</a>
<a href="/auth/facebook">Facebook</a>
</div>
<p>New here? <a href="/register">Register</a>.</p>"#,
    )
}

pub fn submit_form() -> String {
    layout(
        "Submit a secret",
        r#"<h1>Share a secret</h1>
<form method="post" action="/submit">
<input type="text" name="secret" placeholder="Your secret" required>
<button type="submit">Share</button>
</form>"#,
    )
}

pub fn secrets_wall(users: &[User]) -> String {
    let mut body = String::from("<h1>Secrets</h1>\n");

    if users.is_empty() {
        body.push_str("<p>No secrets shared yet. Be the first.</p>\n");
    }

    for user in users {
        if let Some(secret) = &user.secret {
            body.push_str(&format!(
                "<div class=\"secret\"><p>{}</p></div>\n",
                escape(secret)
            ));
        }
    }

    body.push_str("<p><a href=\"/submit\">Share yours</a></p>");
    layout("Secrets", &body)
}

pub fn error_page() -> String {
    layout(
        "Something went wrong",
        r#"<h1>Something went wrong</h1>
<p>We could not complete that request. Please try again in a moment.</p>
<p><a href="/">Back to the start</a></p>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::provider::Provider;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("it's & that"), "it&#39;s &amp; that");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_secrets_wall_escapes_content() {
        let mut user = User::federated(Provider::Google, "g-1");
        user.set_secret("<b>sneaky</b>".to_string());

        let html = secrets_wall(&[user]);
        assert!(html.contains("&lt;b&gt;sneaky&lt;/b&gt;"));
        assert!(!html.contains("<b>sneaky</b>"));
    }

    #[test]
    fn test_empty_wall_mentions_it() {
        let html = secrets_wall(&[]);
        assert!(html.contains("No secrets shared yet"));
    }
}
