//! Macro provenance
//!
//! Every `#define` gets a [`MacroDefId`], every expansion event an
//! [`ExpansionId`]. Tokens produced by an expansion carry the id of the
//! outermost expansion (the one written in a file) together with their index
//! in that expansion's output, which is enough to split a node's token range
//! into file locations and macro-expansion locations.

use crate::lexer::Token;
use crate::source_manager::{SourceLoc, SourceSpan};
use serde::Serialize;
use std::num::NonZeroU32;
use symbol_table::GlobalSymbol as Symbol;

/// Index of a macro definition in the [`LocationMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MacroDefId(NonZeroU32);

impl MacroDefId {
    fn from_index(index: usize) -> Self {
        MacroDefId(NonZeroU32::new(index as u32 + 1).unwrap_or(NonZeroU32::MIN))
    }

    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Index of an expansion event in the [`LocationMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExpansionId(NonZeroU32);

impl ExpansionId {
    fn from_index(index: usize) -> Self {
        ExpansionId(NonZeroU32::new(index as u32 + 1).unwrap_or(NonZeroU32::MIN))
    }

    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// A `#define` (or a predefined macro)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: Symbol,
    /// Span of the macro name in the `#define`; builtin span for predefined macros
    pub name_span: SourceSpan,
    /// `None` for object-like macros
    pub parameters: Option<Vec<Symbol>>,
    pub variadic: bool,
    /// Replacement list as written, tokens separated by single spaces
    pub expansion: String,
    pub predefined: bool,
}

impl MacroDefinition {
    pub fn is_function_like(&self) -> bool {
        self.parameters.is_some()
    }

    /// `NAME(a,b)=body` style rendering
    pub fn signature(&self) -> String {
        match &self.parameters {
            None => format!("{}={}", self.name, self.expansion),
            Some(params) => {
                let mut list: Vec<&str> = params.iter().map(|p| p.as_str()).collect();
                if self.variadic && !list.last().is_some_and(|p| p.ends_with("...")) {
                    list.push("...");
                }
                format!("{}({})={}", self.name, list.join(","), self.expansion)
            }
        }
    }
}

/// One macro expansion event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionRecord {
    pub definition: MacroDefId,
    pub name: Symbol,
    /// Invocation text in a file: the macro name up to the closing parenthesis
    pub invocation: SourceSpan,
    /// Expansion whose output contained this invocation
    pub parent: Option<ExpansionId>,
    /// Number of tokens produced (outermost expansions only)
    pub token_count: u32,
}

/// One entry of a node's location list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeLocation {
    File(SourceSpan),
    /// `offset` and `length` count tokens of the expansion's output
    Macro {
        expansion: ExpansionId,
        offset: u32,
        length: u32,
    },
}

impl NodeLocation {
    pub fn is_file(&self) -> bool {
        matches!(self, NodeLocation::File(_))
    }
}

/// Table of macro definitions and expansion events for one translation unit
#[derive(Debug, Clone, Default)]
pub struct LocationMap {
    definitions: Vec<MacroDefinition>,
    expansions: Vec<ExpansionRecord>,
}

impl LocationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_definition(&mut self, definition: MacroDefinition) -> MacroDefId {
        self.definitions.push(definition);
        MacroDefId::from_index(self.definitions.len() - 1)
    }

    pub fn add_expansion(&mut self, record: ExpansionRecord) -> ExpansionId {
        self.expansions.push(record);
        ExpansionId::from_index(self.expansions.len() - 1)
    }

    pub fn definition(&self, id: MacroDefId) -> Option<&MacroDefinition> {
        self.definitions.get(id.index())
    }

    pub fn definitions(&self) -> impl Iterator<Item = (MacroDefId, &MacroDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (MacroDefId::from_index(i), d))
    }

    pub fn expansion(&self, id: ExpansionId) -> Option<&ExpansionRecord> {
        self.expansions.get(id.index())
    }

    pub(crate) fn expansion_mut(&mut self, id: ExpansionId) -> Option<&mut ExpansionRecord> {
        self.expansions.get_mut(id.index())
    }

    pub fn expansion_count(&self) -> usize {
        self.expansions.len()
    }

    /// Macro definition used by an expansion event
    pub fn expansion_definition(&self, id: ExpansionId) -> Option<&MacroDefinition> {
        self.expansion(id).and_then(|e| self.definition(e.definition))
    }

    /// `id` followed by its parents up to the expansion written in a file
    pub fn expansion_chain(&self, id: ExpansionId) -> Vec<ExpansionId> {
        let mut chain = vec![id];
        let mut current = id;
        // parents always precede their children, so the walk terminates
        while let Some(parent) = self.expansion(current).and_then(|e| e.parent) {
            if parent >= current {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// File range a location list entry stands for
    pub fn closest_file_location(&self, location: &NodeLocation) -> Option<SourceSpan> {
        match location {
            NodeLocation::File(span) => Some(*span),
            NodeLocation::Macro { expansion, .. } => {
                let outer = *self.expansion_chain(*expansion).last()?;
                self.expansion(outer).map(|e| e.invocation)
            }
        }
    }

    /// Split a token range into its location list.
    ///
    /// Runs of file tokens become one file location; runs of consecutive
    /// tokens from one expansion become one macro location. File text between
    /// an expansion and the next file token (the whitespace after the
    /// invocation) is attributed to the following file location, file text
    /// between a file token and an invocation to the preceding one.
    pub fn node_locations(&self, tokens: &[Token]) -> Vec<NodeLocation> {
        let mut locations = Vec::new();
        // pending file run: start and end of the text covered so far
        let mut file_run: Option<(SourceLoc, SourceLoc)> = None;
        // file position right after the last invocation
        let mut gap_start: Option<SourceLoc> = None;

        for token in tokens {
            let span = token.span;
            let Some(expansion) = token.expansion else {
                file_run = match (file_run, gap_start) {
                    (Some((start, _)), _) if start.source_id == span.source_id() => Some((start, span.end())),
                    (Some((start, end)), _) => {
                        locations.push(NodeLocation::File(SourceSpan::new(start, end)));
                        Some((span.start(), span.end()))
                    }
                    (None, Some(gap)) if gap.source_id == span.source_id() && gap.offset <= span.offset() => {
                        Some((gap, span.end()))
                    }
                    (None, _) => Some((span.start(), span.end())),
                };
                gap_start = None;
                continue;
            };

            let outer = expansion.outer;
            let index = token.expansion_index;
            if file_run.is_none()
                && let Some(NodeLocation::Macro {
                    expansion: last,
                    offset,
                    length,
                }) = locations.last_mut()
                && *last == outer
                && *offset + *length == index
            {
                *length += 1;
                continue;
            }

            let invocation = self.expansion(outer).map(|e| e.invocation).unwrap_or(span);
            if let Some((start, end)) = file_run.take() {
                let end = if start.source_id == invocation.source_id() && start.offset <= invocation.offset() {
                    invocation.start()
                } else {
                    end
                };
                locations.push(NodeLocation::File(SourceSpan::new(start, end)));
            }
            locations.push(NodeLocation::Macro {
                expansion: outer,
                offset: index,
                length: 1,
            });
            gap_start = Some(invocation.end());
        }

        if let Some((start, end)) = file_run {
            locations.push(NodeLocation::File(SourceSpan::new(start, end)));
        }
        locations
    }
}
