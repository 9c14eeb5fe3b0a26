//! Browser Client
//!
//! The shell page a browser loads before any component is shown. Its script
//! opens the session socket, asks for the first render, keeps the session
//! alive with heartbeats, reconnects after drops, swaps in every fragment the
//! server pushes and puts the caret back into the input being edited.
//!
//! Serving the page is up to the embedding HTTP stack; [`shell_page`] only
//! produces it.

use serde::Deserialize;

use crate::render::BIND_ATTRIBUTE;
use crate::session::{Config, SessionId};

/// What the page does while the server is unreachable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OfflineAction {
    /// Cover the page with a "Disconnected" sheet. Nothing can be clicked or
    /// even selected until the connection is back.
    #[default]
    DisablePage,

    /// Disable inputs, buttons, text areas and selects; the rest of the page
    /// stays readable and scrollable.
    DisableForms,

    /// Show nothing. Buttons silently do nothing while offline. Only suitable
    /// for read-only pages over flaky connections.
    DoNothing,
}

impl OfflineAction {
    /// Body of the client's `setIsConnected(isConnected)` function.
    pub fn script(self) -> &'static str {
        match self {
            OfflineAction::DisablePage => {
                r#"
    var display = isConnected ? "none" : "flex";
    document.getElementById("disconnectedoverlay").style.display = display;"#
            }
            OfflineAction::DisableForms => {
                r#"
    document.getElementById("disconnectedoverlay").style.display = "none";
    ["input", "button", "textarea", "select"].forEach(function (selector) {
        document.querySelectorAll(selector).forEach(function (el) {
            el.disabled = !isConnected;
        });
    });"#
            }
            OfflineAction::DoNothing => "",
        }
    }
}

const SHELL: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<script>
var ws, heartbeat, active;

function setIsConnected(isConnected) {__IS_CONNECTED__
}

function openConnection() {
    ws = new WebSocket(__WS_URL__);
    ws.onopen = function () {
        setIsConnected(true);
        send("app.Refresh");
        heartbeat = setInterval(function () {
            ws.send(JSON.stringify({method: "heartbeat"}));
        }, __HEARTBEAT_MS__);
    };
    ws.onclose = function () {
        clearInterval(heartbeat);
        ws = null;
        setIsConnected(false);
        setTimeout(openConnection, __RECONNECT_MS__);
    };
    ws.onmessage = function (evt) {
        document.getElementById("app").innerHTML = evt.data;
        restoreCursor();
    };
}

function restoreCursor() {
    if (!active) {
        return;
    }
    var el = document.querySelector('[__BIND_ATTR__="' + active.bind + '"]');
    if (!el) {
        return;
    }
    el.focus();
    if (el.setSelectionRange && active.start !== null) {
        el.setSelectionRange(active.start, active.end);
    }
}

function send(method, self) {
    if (!ws) {
        return;
    }
    var payload = {method: method};
    if (self) {
        if (self.dataset && self.dataset.key !== undefined) {
            payload.key = self.dataset.key;
        }
        if (self.value !== undefined) {
            payload.value = String(self.value);
        }
    }
    ws.send(JSON.stringify(payload));
}

function sendSetAttribute(component, name, self) {
    active = {
        bind: component + "." + name,
        start: self.selectionStart,
        end: self.selectionEnd
    };
    if (!ws) {
        return;
    }
    ws.send(JSON.stringify({method: component + ".SetAttribute", key: name, value: self.value}));
}

window.addEventListener("load", openConnection);
</script>
<style>
.disconnected {
    display: none;
    position: fixed;
    top: 0; bottom: 0; left: 0; right: 0;
    background-color: black;
    opacity: 0.5;
    color: white;
    font-size: 32px;
    font-weight: bold;
    align-items: center;
}
</style>
</head>
<body>
<div id="app"></div>
<div class="disconnected" id="disconnectedoverlay"><div style="text-align: center; width: 100%">Disconnected</div></div>
</body>
</html>
"#;

/// Render the shell page for a fresh browser session.
///
/// `ws_base` is the socket endpoint prefix, e.g. `ws://localhost:8080/ws`;
/// a newly generated session identifier is appended as the last path segment.
pub fn shell_page(config: &Config, ws_base: &str) -> String {
    shell_page_for(config, ws_base, &SessionId::generate())
}

/// Render the shell page for a known session identifier.
pub fn shell_page_for(config: &Config, ws_base: &str, session: &SessionId) -> String {
    let ws_url = format!("{}/{}", ws_base.trim_end_matches('/'), session);
    // The URL goes in last so text it carries is never taken for a placeholder.
    SHELL
        .replace("__IS_CONNECTED__", config.offline_action.script())
        .replace("__HEARTBEAT_MS__", &config.heartbeat_interval.as_millis().to_string())
        .replace("__RECONNECT_MS__", &config.reconnect_interval.as_millis().to_string())
        .replace("__BIND_ATTR__", BIND_ATTRIBUTE)
        .replace("__WS_URL__", &js_string(&ws_url))
}

/// Quote text as a JavaScript string literal for a `<script>` block.
///
/// JSON string syntax covers quotes, backslashes and control characters.
/// `<` is escaped so the text cannot close the script element, and the two
/// line separators JSON allows raw are escaped for older parsers.
fn js_string(raw: &str) -> String {
    serde_json::Value::from(raw)
        .to_string()
        .replace('<', "\\u003c")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn page(config: &Config) -> String {
        shell_page_for(config, "ws://localhost:8080/ws/", &SessionId::new("abc"))
    }

    #[test]
    fn page_points_at_session_socket() {
        let html = page(&Config::default());
        assert!(html.contains(r#"new WebSocket("ws://localhost:8080/ws/abc")"#));
        assert!(html.contains(r#"send("app.Refresh")"#));
        assert!(!html.contains("__"));
    }

    #[test]
    fn page_uses_configured_intervals() {
        let config = Config::default()
            .with_heartbeat_interval(Duration::from_millis(250))
            .with_reconnect_interval(Duration::from_millis(1500));
        let html = page(&config);
        assert!(html.contains("}, 250);"));
        assert!(html.contains("setTimeout(openConnection, 1500)"));
    }

    #[test]
    fn offline_actions_change_the_script() {
        let disable_page = page(&Config::default());
        assert!(disable_page.contains(r#"isConnected ? "none" : "flex""#));

        let disable_forms = page(&Config::default().with_offline_action(OfflineAction::DisableForms));
        assert!(disable_forms.contains("el.disabled = !isConnected"));

        let nothing = page(&Config::default().with_offline_action(OfflineAction::DoNothing));
        assert!(nothing.contains("function setIsConnected(isConnected) {\n}"));
    }

    #[test]
    fn cursor_restore_uses_bind_attribute() {
        let html = page(&Config::default());
        assert!(html.contains(&format!(r#"'[{BIND_ATTRIBUTE}="'"#)));
    }

    #[test]
    fn generated_pages_get_distinct_sessions() {
        let a = shell_page(&Config::default(), "ws://h/ws");
        let b = shell_page(&Config::default(), "ws://h/ws");
        assert_ne!(a, b);
    }

    #[test]
    fn url_is_escaped_for_script() {
        assert_eq!(js_string(r#"a"b</script>"#), r#""a\"b\u003c/script>""#);
        assert_eq!(js_string("a\\b\nc\u{2028}d"), r#""a\\b\nc\u2028d""#);
        assert_eq!(js_string("tab\there\u{1}"), r#""tab\there\u0001""#);
    }

    #[test]
    fn hostile_session_cannot_leave_the_socket_literal() {
        let session = SessionId::new("x\"); alert(1); //</script><script>__HEARTBEAT_MS__");
        let html = shell_page_for(&Config::default(), "ws://h/ws", &session);

        assert_eq!(html.matches("</script>").count(), 1);
        assert!(html.contains(r#"new WebSocket("ws://h/ws/x\"); alert(1); //\u003c/script>\u003cscript>__HEARTBEAT_MS__")"#));
    }
}
