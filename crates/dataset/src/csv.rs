use std::borrow::Cow;

/// Minimal CSV assembly with RFC-style quoting. Field order is fixed by
/// the caller; the builder never reorders or drops anything.
pub struct CsvBuilder {
    buf: String,
}

impl CsvBuilder {
    pub fn new(header: &[&str]) -> Self {
        let mut builder = Self { buf: String::new() };
        builder.row(header.iter().map(|cell| cell.to_string()));
        builder
    }

    pub fn row<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut first = true;
        for cell in cells {
            if !first {
                self.buf.push(',');
            }
            first = false;
            self.buf.push_str(&escape(&cell));
        }
        self.buf.push('\n');
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

fn escape(field: &str) -> Cow<'_, str> {
    let needs_quoting = field
        .chars()
        .any(|ch| matches!(ch, ',' | '"' | '\n' | '\r'));
    if !needs_quoting {
        return Cow::Borrowed(field);
    }
    let mut quoted = String::with_capacity(field.len() + 2);
    quoted.push('"');
    quoted.push_str(&field.replace('"', "\"\""));
    quoted.push('"');
    Cow::Owned(quoted)
}
