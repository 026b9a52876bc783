//! Generated Go entrypoints.
//!
//! Every target is compiled with a synthesized `main` that fills the shared
//! `Args` struct (`Name`, `ConfigFile`, `Flags map[string][]string`) with
//! literal values and hands it to the target's `<Symbol>App(Args) error`
//! function. The complete flag mapping of every declared target is embedded,
//! so a target can inspect the flags of its siblings.

use crate::config::Settings;
use crate::targets::FlagMapping;
use std::fmt::Write;

/// Bump when the generated program shape changes.
pub const TEMPLATE_VERSION: u32 = 2;

pub const ENTRYPOINT_TEMPLATE: &str = r#"// Code generated by mb (template v{{ version }}) for {{ name }}. DO NOT EDIT.
package main

import (
	"fmt"
	"os"{{ imports }}
)

func main() {
	args := Args{}
	args.Name = {{ name_literal }}
	args.ConfigFile = {{ config_literal }}
	args.Flags = make(map[string][]string)
{{ flags }}
	if err := runApp(args); err != nil {
		fmt.Fprintf(os.Stderr, "%v\n", err)
		os.Exit(1)
	}
}

func runApp(args Args) error {
{{ guard }}	return {{ symbol }}(args)
}
"#;

const PLATFORM_GUARD: &str = r#"	if runtime.GOOS != {{ platform_literal }} {
		return fmt.Errorf("%s was built for %s, unable to run on %s", args.Name, {{ platform_literal }}, runtime.GOOS)
	}
"#;

/// Everything a generated entrypoint embeds.
#[derive(Debug, Clone)]
pub struct EntrypointContext<'a> {
    pub name: &'a str,
    pub symbol: String,
    pub config_file: String,
    pub flags: &'a FlagMapping,
    /// Expected `runtime.GOOS`, checked before the target runs.
    pub platform_guard: Option<&'a str>,
}

impl<'a> EntrypointContext<'a> {
    pub fn new(name: &'a str, settings: &'a Settings, flags: &'a FlagMapping) -> Self {
        Self {
            name,
            symbol: symbol_name(name),
            config_file: settings.declaration_path(name).to_string_lossy().to_string(),
            flags,
            platform_guard: settings
                .platform_guard
                .then_some(settings.platform.as_str()),
        }
    }

    pub fn render(&self) -> Result<String, String> {
        let mut flag_lines = String::new();
        for (target, flags) in self.flags {
            let items: Vec<String> = flags.iter().map(|f| go_quote(f)).collect();
            let _ = writeln!(
                flag_lines,
                "\targs.Flags[{}] = []string{{{}}}",
                go_quote(target),
                items.join(", ")
            );
        }
        let flag_lines = flag_lines.trim_end_matches('\n').to_string();

        let (imports, guard) = match self.platform_guard {
            Some(platform) => (
                "\n\t\"runtime\"".to_string(),
                render(PLATFORM_GUARD, &[("platform_literal", go_quote(platform))])?,
            ),
            None => (String::new(), String::new()),
        };

        render(
            ENTRYPOINT_TEMPLATE,
            &[
                ("version", TEMPLATE_VERSION.to_string()),
                ("name", self.name.to_string()),
                ("imports", imports),
                ("name_literal", go_quote(self.name)),
                ("config_literal", go_quote(&self.config_file)),
                ("flags", flag_lines),
                ("guard", guard),
                ("symbol", self.symbol.clone()),
            ],
        )
    }
}

/// Go entry function for a target: `git-uncommitted` -> `GitUncommittedApp`.
pub fn symbol_name(target: &str) -> String {
    let mut symbol: String = target
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    symbol.push_str("App");
    symbol
}

/// Quote `value` as an interpreted Go string literal.
pub fn go_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Substitute `{{ key }}` placeholders. Substituted values are not scanned
/// again, and an unknown key is an error.
fn render(template: &str, vars: &[(&str, String)]) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| "unterminated placeholder in template".to_string())?;
        let key = after[..end].trim();
        let value = vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| format!("template variable '{}' is not defined", key))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
