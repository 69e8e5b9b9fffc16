//! HTML rendering. Plain string builders, no template engine; every
//! interpolated value goes through `escape` so stored content can never
//! inject markup.

use std::fmt::Write;

use parley_db::models::{MessageHit, MessageRow};
use parley_types::models::{PartyDetail, PartyHit, PartyRef, Profile};

use crate::session::RequestContext;

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(ctx: &RequestContext, title: &str, body: &str) -> String {
    let account = match (ctx.visitor.user_id, ctx.visitor.username.as_deref()) {
        (Some(id), Some(username)) => format!(
            "<a href=\"/user/{}\">{}</a> <a href=\"/logout\">Log out</a>",
            id,
            escape(username)
        ),
        _ => "<a href=\"/login\">Log in</a> <a href=\"/account\">Register</a>".to_string(),
    };

    let menu_title = if ctx.visitor.is_authenticated() {
        "My parties"
    } else {
        "Top parties"
    };

    let mut menu = String::new();
    for p in &ctx.menu.entries {
        let _ = write!(
            menu,
            "<li><a href=\"/party/{}\">{}</a></li>",
            p.id,
            escape(&p.name)
        );
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title} - Parley</title></head>\n<body>\n\
         <header><a href=\"/\">Parley</a> <nav>{account}</nav>\n\
         <form action=\"/search\" method=\"get\"><input type=\"text\" name=\"query\" placeholder=\"Search\"><button>Search</button></form>\n\
         </header>\n\
         <aside><h2>{menu_title}</h2><ul>{menu}</ul><a href=\"/party\">Start a party</a></aside>\n\
         <main>{body}</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

pub fn home(ctx: &RequestContext) -> String {
    let body = match ctx.visitor.username.as_deref() {
        Some(username) => format!(
            "<h1>Welcome back, {}</h1><p>Pick a party from the menu or start your own.</p>",
            escape(username)
        ),
        None => "<h1>Welcome to Parley</h1>\
                 <p><a href=\"/account\">Register</a> or <a href=\"/login\">log in</a> to join the conversation.</p>"
            .to_string(),
    };
    layout(ctx, "Home", &body)
}

pub fn create_party(ctx: &RequestContext, parent_id: Option<i64>) -> String {
    let (title, action) = match parent_id {
        Some(parent) => ("New sub-party", format!("/party/{}/new", parent)),
        None => ("New party", "/party".to_string()),
    };

    let body = format!(
        "<h1>{title}</h1>\n\
         <form action=\"{action}\" method=\"post\">\n\
         <label>Name <input type=\"text\" name=\"name\" required></label>\n\
         <label>Description <textarea name=\"description\"></textarea></label>\n\
         <button>Create</button>\n\
         </form>",
    );
    layout(ctx, title, &body)
}

pub fn party(
    ctx: &RequestContext,
    party: &PartyDetail,
    messages: &[MessageRow],
    children: &[PartyRef],
) -> String {
    let mut body = String::new();

    if let Some(parent) = &party.parent {
        let _ = write!(
            body,
            "<p>part of <a href=\"/party/{}\">{}</a></p>",
            parent.id,
            escape(&parent.name)
        );
    }

    let _ = write!(
        body,
        "<h1>{}</h1><p>{}</p>",
        escape(&party.name),
        escape(&party.description)
    );

    if ctx.visitor.is_authenticated() && !ctx.menu.is_subscribed(party.id) {
        let _ = write!(
            body,
            "<form action=\"/subscribe/{}\" method=\"post\"><button>Subscribe</button></form>",
            party.id
        );
    }

    body.push_str("<h2>Sub-parties</h2><ul>");
    for child in children {
        let _ = write!(
            body,
            "<li><a href=\"/party/{}\">{}</a></li>",
            child.id,
            escape(&child.name)
        );
    }
    let _ = write!(
        body,
        "</ul><a href=\"/party/{}/new\">Start a sub-party</a>",
        party.id
    );

    body.push_str("<h2>Messages</h2><ul id=\"messages\">");
    for message in messages {
        let _ = write!(
            body,
            "<li data-id=\"{}\"><strong>{}</strong> {} <time>{}</time></li>",
            message.id,
            escape(&message.username),
            escape(&message.body),
            escape(&message.sent_on)
        );
    }
    body.push_str("</ul>");

    if ctx.visitor.is_authenticated() {
        let _ = write!(
            body,
            "<form action=\"/party/{}\" method=\"post\">\
             <input type=\"text\" name=\"body\" placeholder=\"Say something\" required>\
             <button>Send</button></form>",
            party.id
        );
    } else {
        body.push_str("<p><a href=\"/login\">Log in</a> to post.</p>");
    }

    layout(ctx, &party.name, &body)
}

pub fn login(ctx: &RequestContext, invalid: bool) -> String {
    let notice = if invalid {
        "<p>Invalid username or password.</p>"
    } else {
        ""
    };

    let body = format!(
        "<h1>Log in</h1>{notice}\n\
         <form action=\"/login\" method=\"post\">\n\
         <label>Username <input type=\"text\" name=\"username\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button>Log in</button>\n\
         </form>\n\
         <p>No account yet? <a href=\"/account\">Register</a>.</p>",
    );
    layout(ctx, "Log in", &body)
}

pub fn account(ctx: &RequestContext) -> String {
    let body = "<h1>Register</h1>\n\
         <form action=\"/account\" method=\"post\">\n\
         <label>First name <input type=\"text\" name=\"first_name\" required></label>\n\
         <label>Last name <input type=\"text\" name=\"last_name\" required></label>\n\
         <label>Email <input type=\"email\" name=\"email\" required></label>\n\
         <label>Username <input type=\"text\" name=\"username\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button>Create account</button>\n\
         </form>";
    layout(ctx, "Register", body)
}

pub fn search(
    ctx: &RequestContext,
    term: &str,
    parties: &[PartyHit],
    messages: &[MessageHit],
) -> String {
    let mut body = format!("<h1>Results for \"{}\"</h1>", escape(term));

    body.push_str("<h2>Parties</h2><ul>");
    for hit in parties {
        let _ = write!(
            body,
            "<li><a href=\"/party/{}\">{}</a> ({} subscribers)</li>",
            hit.id,
            escape(&hit.name),
            hit.subscribers
        );
    }
    body.push_str("</ul>");

    body.push_str("<h2>Messages</h2><ul>");
    for hit in messages {
        let _ = write!(
            body,
            "<li><a href=\"/party/{}\">{}</a> <time>{}</time></li>",
            hit.party_id,
            escape(&hit.body),
            escape(&hit.sent_on)
        );
    }
    body.push_str("</ul>");

    layout(ctx, "Search", &body)
}

pub fn profile(ctx: &RequestContext, profile: &Profile, subscriptions: &[PartyRef]) -> String {
    let mut body = format!(
        "<h1>{} {}</h1>\n\
         <p>@{} &middot; {}</p>\n\
         <h2>Subscriptions</h2><ul>",
        escape(&profile.first_name),
        escape(&profile.last_name),
        escape(&profile.username),
        escape(&profile.email),
    );

    for party in subscriptions {
        let _ = write!(
            body,
            "<li><a href=\"/party/{}\">{}</a></li>",
            party.id,
            escape(&party.name)
        );
    }
    body.push_str("</ul>");

    layout(ctx, &profile.username, &body)
}

pub fn not_found() -> String {
    layout(
        &RequestContext::default(),
        "Not found",
        "<h1>Not found</h1><p>That page does not exist. <a href=\"/\">Head home</a>.</p>",
    )
}

pub fn error_page(message: &str) -> String {
    layout(
        &RequestContext::default(),
        "Error",
        &format!("<h1>Error</h1><p>{}</p>", escape(message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Menu, Visitor};
    use std::collections::HashMap;

    fn authed_ctx() -> RequestContext {
        let entries = vec![PartyRef {
            id: 1,
            name: "Book Club".to_string(),
        }];
        let mine = entries
            .iter()
            .map(|p| (p.id, p.name.clone()))
            .collect::<HashMap<_, _>>();
        RequestContext {
            visitor: Visitor {
                user_id: Some(7),
                username: Some("alice".to_string()),
            },
            menu: Menu { entries, mine },
        }
    }

    #[test]
    fn escape_covers_html_specials() {
        assert_eq!(
            escape("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn message_bodies_are_escaped() {
        let party = PartyDetail {
            id: 1,
            name: "Book Club".to_string(),
            description: "".to_string(),
            parent: None,
        };
        let messages = vec![MessageRow {
            id: 1,
            party_id: 1,
            user_id: 7,
            username: "alice".to_string(),
            body: "<script>alert(1)</script>".to_string(),
            sent_on: "2026-08-06 12:00:00".to_string(),
        }];

        let html = super::party(&authed_ctx(), &party, &messages, &[]);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn menu_differs_for_guests_and_users() {
        let html = home(&authed_ctx());
        assert!(html.contains("My parties"));
        assert!(html.contains("Book Club"));
        assert!(html.contains("Log out"));

        let html = home(&RequestContext::default());
        assert!(html.contains("Top parties"));
        assert!(html.contains("Log in"));
    }

    #[test]
    fn subscribe_button_hidden_when_subscribed() {
        let party = PartyDetail {
            id: 1,
            name: "Book Club".to_string(),
            description: "".to_string(),
            parent: None,
        };

        // id 1 is in the visitor's subscriptions
        let html = super::party(&authed_ctx(), &party, &[], &[]);
        assert!(!html.contains("/subscribe/1"));

        let other = PartyDetail { id: 2, ..party };
        let html = super::party(&authed_ctx(), &other, &[], &[]);
        assert!(html.contains("/subscribe/2"));
    }
}
