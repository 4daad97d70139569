//! Statement execution boundary

use super::ExportError;
use std::io::Write;
use tracing::debug;

/// Runs a set of SQL statements.
///
/// Implementations receive one statement set per call and decide on
/// transactional grouping themselves; nothing is retried.
pub trait StatementExecutor {
    fn execute(&mut self, statements: &[String]) -> Result<(), ExportError>;
}

/// Dry-run executor writing each statement, `;`-terminated, to a writer
#[derive(Debug)]
pub struct WriterExecutor<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> WriterExecutor<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of statements written so far
    pub fn statements_written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatementExecutor for WriterExecutor<W> {
    fn execute(&mut self, statements: &[String]) -> Result<(), ExportError> {
        for statement in statements {
            writeln!(self.writer, "{};", statement)?;
        }
        self.writer.flush()?;
        self.written += statements.len();
        debug!(count = statements.len(), "Wrote statements");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_executor() {
        let mut executor = WriterExecutor::new(Vec::new());
        executor
            .execute(&["CREATE SCHEMA a".to_string(), "CREATE SCHEMA b".to_string()])
            .unwrap();
        executor.execute(&[]).unwrap();
        assert_eq!(executor.statements_written(), 2);
        let output = String::from_utf8(executor.into_inner()).unwrap();
        assert_eq!(output, "CREATE SCHEMA a;\nCREATE SCHEMA b;\n");
    }
}
