use colored::*;

/// Turns common Go toolchain failures into a hint for the failed target.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str, symbol: &str) -> Option<String> {
        // 1. Entry file does not define the expected entry function
        if output.contains(&format!("undefined: {}", symbol)) {
            return Some(format!(
                "The entry file must define {}.",
                format!("func {}(args Args) error", symbol).bold().yellow()
            ));
        }

        // 2. Shared sources lack the Args type the entrypoint fills in
        if output.contains("undefined: Args") || output.contains("has no field or method") {
            return Some(format!(
                "The shared sources must declare {} with {}, {} and {}.",
                "type Args".bold().yellow(),
                "Name string".bold(),
                "ConfigFile string".bold(),
                "Flags map[string][]string".bold()
            ));
        }

        // 3. Vendor directory out of sync with go.mod
        if output.contains("inconsistent vendoring") || output.contains("cannot find module providing package") {
            return Some(format!(
                "Module dependencies are not vendored.\nRun {} and try again.",
                "go mod vendor".bold().green()
            ));
        }

        // 4. Toolchain missing from PATH
        if output.contains("No such file or directory") && output.contains("spawn") {
            return Some(format!(
                "The Go toolchain could not be started. Install Go or point {} at it.",
                "GO".bold().yellow()
            ));
        }

        None
    }
}
