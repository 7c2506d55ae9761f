//! `Module01` tool bundle.
//!
//! [`ProductTools`] is the processor bound to `Module01`. It fans the lifecycle hooks out
//! to the OCR, PDF and Word tools. A tool that declines or faults during
//! [`initialize`](ModuleProcessor::initialize) rolls back every tool started before it.
//! Starting a running tool or releasing a stopped one is a no-op.

mod error;
mod ocr;
mod pdf;
mod tool;
mod word;

pub use crate::error::{ToolError, ToolErrorExt};
pub use crate::ocr::OcrProcessor;
pub use crate::pdf::PdfProcessor;
pub use crate::word::WordProcessor;

use mstone_kernel::processor::{ModuleProcessor, ProcessorFault, ProcessorFaultExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Processor for `Module01`.
#[derive(Debug)]
pub struct ProductTools {
    tools: Vec<Arc<dyn ModuleProcessor>>,
}

impl ProductTools {
    /// The standard bundle: OCR, PDF and Word, started in that order.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: vec![
                Arc::new(OcrProcessor::new()),
                Arc::new(PdfProcessor::new()),
                Arc::new(WordProcessor::new()),
            ],
        }
    }

    /// A bundle over an arbitrary tool list.
    ///
    /// # Errors
    /// Returns [`ToolError::Validation`] for an empty list or a repeated tool name.
    pub fn with_tools(tools: Vec<Arc<dyn ModuleProcessor>>) -> Result<Self, ToolError> {
        if tools.is_empty() {
            return Err(ToolError::Validation { message: "no tools".into(), context: None });
        }
        for (index, tool) in tools.iter().enumerate() {
            if tools[..index].iter().any(|other| other.name() == tool.name()) {
                return Err(ToolError::Validation {
                    message: format!("tool '{}' appears twice", tool.name()).into(),
                    context: None,
                });
            }
        }
        Ok(Self { tools })
    }

    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Releases `indices` in reverse start order. Faults are logged, not returned.
    fn roll_back(&self, indices: &[usize]) {
        for &index in indices.iter().rev() {
            let tool = &self.tools[index];
            match tool.cleanup() {
                Ok(true) => debug!(tool = tool.name(), "Rolled back"),
                Ok(false) => warn!(tool = tool.name(), "Tool declined rollback"),
                Err(e) => warn!(tool = tool.name(), error = %e, "Rollback fault"),
            }
        }
    }
}

impl Default for ProductTools {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleProcessor for ProductTools {
    fn name(&self) -> &str {
        "product_tools"
    }

    fn initialize(&self) -> Result<bool, ProcessorFault> {
        info!(tools = ?self.tool_names(), "Initializing tool bundle");

        let mut started = Vec::with_capacity(self.tools.len());

        for (index, tool) in self.tools.iter().enumerate() {
            match tool.initialize().context(tool.name().to_owned()) {
                Ok(true) => started.push(index),
                Ok(false) => {
                    warn!(tool = tool.name(), "Tool declined to start");
                    self.roll_back(&started);
                    return Ok(false);
                },
                Err(e) => {
                    warn!(tool = tool.name(), error = %e, "Tool faulted while starting");
                    self.roll_back(&started);
                    return Err(e);
                },
            }
        }

        Ok(true)
    }

    fn cleanup(&self) -> Result<bool, ProcessorFault> {
        info!("Cleaning up tool bundle");

        let mut declined = false;
        let mut first_fault = None;

        for tool in &self.tools {
            match tool.cleanup().context(tool.name().to_owned()) {
                Ok(true) => {},
                Ok(false) => {
                    warn!(tool = tool.name(), "Tool declined to release");
                    declined = true;
                },
                Err(e) => {
                    warn!(tool = tool.name(), error = %e, "Tool faulted while releasing");
                    first_fault.get_or_insert(e);
                },
            }
        }

        match first_fault {
            Some(fault) => Err(fault),
            None => Ok(!declined),
        }
    }
}
