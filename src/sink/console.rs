use tracing::info;

use crate::domain::Record;
use crate::sink::PresentationSink;

/// Prints records to stdout as they arrive.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    printed: usize,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn print(&mut self, record: &Record) {
        self.printed += 1;
        for line in describe(self.printed, record) {
            println!("{}", line);
        }
    }
}

fn describe(index: usize, record: &Record) -> Vec<String> {
    let prompt = if record.prompt_params.is_empty() {
        record.prompt.clone()
    } else {
        format!("{} {}", record.prompt, record.prompt_params)
    };
    let user = if record.has_known_author() {
        format!("{} ({})", record.user_name, record.user_id)
    } else {
        record.user_name.clone()
    };
    vec![
        format!("Image {}:", index),
        format!("  Prompt:  {}", prompt),
        format!("  Image:   {}", record.display_link()),
        format!("  Preview: {}", record.preview_link()),
        format!("  Job:     {}", record.job_id),
        format!("  User:    {}", user),
    ]
}

impl PresentationSink for ConsoleSink {
    fn on_incremental_record(&mut self, record: &Record) {
        self.print(record);
    }

    fn on_batch_complete(&mut self, records: &[Record]) {
        // Anything not yet shown (none in a normal run) is printed now.
        for record in records.iter().skip(self.printed) {
            self.print(record);
        }
        println!("Collected {} unique images", records.len());
    }

    fn on_status(&mut self, text: &str) {
        info!("{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Author;

    #[test]
    fn test_console_sink_counts_printed_records() {
        let record = Record::new("a", "link", "img.webp", Author::default(), "p --v 6");
        let mut sink = ConsoleSink::new();
        sink.on_incremental_record(&record);
        sink.on_batch_complete(std::slice::from_ref(&record));
        assert_eq!(sink.printed, 1);
    }

    #[test]
    fn test_describe_record() {
        let author = Author {
            user_name: "bob".into(),
            user_id: "u1".into(),
            user_profile_link: String::new(),
        };
        let record = Record::new("a", "link", "https://cdn/a/0_0.webp", author, "fox --v 6");

        let lines = describe(3, &record);
        assert_eq!(lines[0], "Image 3:");
        assert_eq!(lines[1], "  Prompt:  fox --v 6");
        assert_eq!(lines[2], "  Image:   https://cdn/a/0_0.png");
        assert_eq!(lines[3], "  Preview: https://cdn/a/0_0_384_N.webp");
        assert_eq!(lines[5], "  User:    bob (u1)");

        let anon = Record::new("b", "link", "img.webp", Author::default(), "p");
        assert_eq!(describe(1, &anon)[5], "  User:    user not found");
    }
}
