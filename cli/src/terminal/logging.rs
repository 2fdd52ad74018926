use colored::*;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::registry::LookupSpan;

/// Event formatter for the terminal: a fixed-width colored level column,
/// the event fields, and the emitting module appended dimmed for the
/// verbose levels so `RUST_LOG` debugging stays navigable.
pub struct SweepFormatter;

fn level_label(level: Level) -> ColoredString {
    match level {
        Level::ERROR => "error".red().bold(),
        Level::WARN => " warn".yellow().bold(),
        Level::INFO => " info".cyan(),
        Level::DEBUG => "debug".magenta(),
        Level::TRACE => "trace".dimmed(),
    }
}

impl<S, N> FormatEvent<S, N> for SweepFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let level = *meta.level();

        write!(writer, "{} ", level_label(level))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        if level >= Level::DEBUG {
            write!(writer, "  {}", meta.target().dimmed())?;
        }
        writeln!(writer)
    }
}

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .event_format(SweepFormatter)
        .with_env_filter(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_column_is_uniformly_wide() {
        let labels = [
            level_label(Level::TRACE),
            level_label(Level::DEBUG),
            level_label(Level::INFO),
            level_label(Level::WARN),
            level_label(Level::ERROR),
        ];
        for label in &labels {
            // ColoredString derefs to the unstyled text
            assert_eq!(label.chars().count(), 5, "label {label:?} breaks alignment");
        }
    }
}
