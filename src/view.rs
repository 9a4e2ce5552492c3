use std::time::{SystemTime, UNIX_EPOCH};

use chat_provider::ProviderProfile;

fn ansi_wrap(text: &str, prefix: &str, suffix: &str) -> String {
    format!("{prefix}{text}{suffix}")
}

pub fn dim(text: &str) -> String {
    ansi_wrap(text, "\x1b[2m", "\x1b[22m")
}

pub fn bold(text: &str) -> String {
    ansi_wrap(text, "\x1b[1m", "\x1b[22m")
}

pub fn cyan(text: &str) -> String {
    ansi_wrap(text, "\x1b[36m", "\x1b[39m")
}

pub fn magenta(text: &str) -> String {
    ansi_wrap(text, "\x1b[35m", "\x1b[39m")
}

pub fn red(text: &str) -> String {
    ansi_wrap(text, "\x1b[31m", "\x1b[39m")
}

/// Startup header shown once before the first prompt.
pub fn banner(profile: Option<&ProviderProfile>) -> String {
    let columns = usize::from(terminal_columns());
    let mut lines = vec![
        format!("{} {}", bold(&cyan("YLDL4u")), dim("terminal chat")),
        dim(&"─".repeat(columns.clamp(20, 60))),
    ];

    if let Some(profile) = profile {
        lines.push(format!(
            "{} {} {} {} {}",
            dim("provider"),
            profile.provider_id,
            dim("•"),
            dim("model"),
            profile.model_id,
        ));
    }

    lines.push(dim("Type your message... Enter sends, Ctrl-D exits."));
    lines.join("\n")
}

/// Notice shown when the provider cannot be constructed at startup. The chat
/// keeps running afterwards; every send then yields the fallback reply.
pub fn offline_notice(error: &str) -> String {
    let headline = format!("Chat provider failed to start: {error}");
    format!(
        "{} {}\n  {}",
        red("!"),
        headline,
        dim("Messages will get an error reply until the provider is configured and YLDL4u is restarted."),
    )
}

pub fn user_prompt() -> String {
    format!("{} ", cyan("you ›"))
}

pub fn reply_prefix() -> String {
    format!("{} ", magenta("yldl4u ›"))
}

/// Current animation frame for the three-dot typing indicator.
pub fn typing_indicator_frame() -> String {
    const FRAMES: [&str; 3] = ["·", "· ·", "· · ·"];
    let index = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|since_epoch| since_epoch.subsec_millis().try_into().ok())
        .unwrap_or(0);
    dim(FRAMES[(index / 334 % 3) as usize])
}

pub fn erase_line() -> &'static str {
    "\r\x1b[2K"
}

#[cfg(unix)]
pub fn terminal_columns() -> u16 {
    read_winsize(libc::STDOUT_FILENO)
        .map(|(cols, _)| cols)
        .unwrap_or(80)
}

#[cfg(not(unix))]
pub fn terminal_columns() -> u16 {
    80
}

#[cfg(unix)]
fn read_winsize(fd: libc::c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ansi(text: &str) -> String {
        let bytes = text.as_bytes();
        let mut output = Vec::with_capacity(bytes.len());
        let mut index = 0;

        while index < bytes.len() {
            if bytes[index] == 0x1b && index + 1 < bytes.len() && bytes[index + 1] == b'[' {
                index += 2;
                while index < bytes.len() {
                    let byte = bytes[index];
                    index += 1;
                    if (b'@'..=b'~').contains(&byte) {
                        break;
                    }
                }
                continue;
            }

            output.push(bytes[index]);
            index += 1;
        }

        String::from_utf8(output).unwrap_or_default()
    }

    #[test]
    fn banner_names_provider_and_model() {
        let profile = ProviderProfile {
            provider_id: "gemini".to_string(),
            model_id: "gemini-2.5-flash".to_string(),
        };
        let banner = strip_ansi(&banner(Some(&profile)));

        assert!(banner.contains("YLDL4u"));
        assert!(banner.contains("provider gemini • model gemini-2.5-flash"));
        assert!(banner.contains("Type your message..."));
    }

    #[test]
    fn banner_without_profile_omits_provider_line() {
        let banner = strip_ansi(&banner(None));

        assert!(banner.contains("YLDL4u"));
        assert!(!banner.contains("provider"));
    }

    #[test]
    fn banner_rule_is_a_bounded_run_of_dashes() {
        let banner = strip_ansi(&banner(None));
        let rule = banner.lines().nth(1).expect("banner rule line");

        assert!(rule.chars().all(|glyph| glyph == '─'));
        let width = rule.chars().count();
        assert!((20..=60).contains(&width));
    }

    #[test]
    fn typing_indicator_frame_cycles_dot_glyphs() {
        let frame = strip_ansi(&typing_indicator_frame());
        assert!(["·", "· ·", "· · ·"].contains(&frame.as_str()));
    }

    #[test]
    fn prompt_labels_are_stable() {
        assert_eq!(strip_ansi(&user_prompt()), "you › ");
        assert_eq!(strip_ansi(&reply_prefix()), "yldl4u › ");
    }

    #[test]
    fn offline_notice_names_the_cause() {
        let notice = strip_ansi(&offline_notice("Missing Gemini API key"));

        assert!(notice.contains("Chat provider failed to start: Missing Gemini API key"));
        assert!(notice.contains("fallback") || notice.contains("error reply"));
    }

    #[test]
    fn erase_line_returns_to_column_zero() {
        assert!(erase_line().starts_with('\r'));
        assert!(erase_line().contains("[2K"));
    }
}
