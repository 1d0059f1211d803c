//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use apppack_core::PackReport;
use console::Term;
use console::style;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    /// Archive and payload sizes, scaled to the largest binary unit that
    /// keeps the value at or above one.
    fn format_size(bytes: u64) -> String {
        const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

        if bytes < 1024 {
            return format!("{bytes} B");
        }

        let mut value = bytes as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        format!("{value:.1} {}", UNITS[unit])
    }

    /// Entry counts with `,` between groups of three digits.
    fn format_number(n: usize) -> String {
        let digits = n.to_string();
        let head = digits.len() % 3;
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (i + 3 - head) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        out
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_pack_result(&self, report: &PackReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} Archive created: {}",
                style("✓").green().bold(),
                report.output_path.display()
            ));
        } else {
            let _ = self.term.write_line(&format!(
                "Archive created: {}",
                report.output_path.display()
            ));
        }

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "  Files added:      {}",
            Self::format_number(report.files_added)
        ));
        if report.symlinks_added > 0 {
            let _ = self.term.write_line(&format!(
                "  Symlinks:         {}",
                Self::format_number(report.symlinks_added)
            ));
        }
        let _ = self.term.write_line(&format!(
            "  Total size:       {}",
            Self::format_size(report.bytes_written)
        ));
        let _ = self.term.write_line(&format!(
            "  Archive size:     {}",
            Self::format_size(report.bytes_compressed)
        ));

        if self.verbose {
            if report.duplicates_skipped > 0 {
                let _ = self.term.write_line(&format!(
                    "  Duplicates:       {}",
                    Self::format_number(report.duplicates_skipped)
                ));
            }
            let ratio = report.compression_ratio();
            if ratio > 0.0 {
                let _ = self
                    .term
                    .write_line(&format!("  Ratio:            {ratio:.2}:1"));
            }
            let _ = self
                .term
                .write_line(&format!("  Duration:         {:?}", report.duration));
        }

        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_step(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("→").cyan().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_archives_in_bytes() {
        // An empty tar.gz is a gzip header around two zero blocks.
        assert_eq!(HumanFormatter::format_size(0), "0 B");
        assert_eq!(HumanFormatter::format_size(45), "45 B");
    }

    #[test]
    fn test_archive_sizes_scale_up() {
        assert_eq!(HumanFormatter::format_size(20 * 1024), "20.0 KB");
        assert_eq!(HumanFormatter::format_size(3 * 1024 * 1024 + 512 * 1024), "3.5 MB");
        assert_eq!(HumanFormatter::format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
        assert_eq!(HumanFormatter::format_size(2 * 1024_u64.pow(4)), "2.0 TB");
    }

    #[test]
    fn test_entry_counts_grouped() {
        assert_eq!(HumanFormatter::format_number(3), "3");
        assert_eq!(HumanFormatter::format_number(120), "120");
        assert_eq!(HumanFormatter::format_number(4096), "4,096");
        assert_eq!(HumanFormatter::format_number(65_536), "65,536");
        assert_eq!(HumanFormatter::format_number(250_000), "250,000");
        assert_eq!(HumanFormatter::format_number(1_048_576), "1,048,576");
    }

    #[test]
    fn test_quiet_suppresses_result() {
        let formatter = HumanFormatter::new(false, true);
        assert!(formatter.format_pack_result(&PackReport::default()).is_ok());
    }
}
