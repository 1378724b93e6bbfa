//! Parse tree nodes and the analyzer callbacks that shape them.

use std::ops::Range;

use crate::lexer::{Position, TokenId};

use super::pattern::PatternId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Token { id: TokenId, image: String },
    Production(PatternId),
}

/// Parse tree node carrying analyzer values.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<V> {
    kind: NodeKind,
    pub start: Position,
    pub span: Range<usize>,
    children: Vec<Node<V>>,
    pub values: Vec<V>,
}

impl<V> Node<V> {
    pub fn token(id: TokenId, image: String, start: Position, span: Range<usize>) -> Self {
        Self {
            kind: NodeKind::Token { id, image },
            start,
            span,
            children: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn production(id: PatternId, start: Position, offset: usize) -> Self {
        Self {
            kind: NodeKind::Production(id),
            start,
            span: offset..offset,
            children: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn token_id(&self) -> Option<TokenId> {
        match self.kind {
            NodeKind::Token { id, .. } => Some(id),
            NodeKind::Production(_) => None,
        }
    }

    pub fn pattern_id(&self) -> Option<PatternId> {
        match self.kind {
            NodeKind::Production(id) => Some(id),
            NodeKind::Token { .. } => None,
        }
    }

    pub fn image(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Token { image, .. } => Some(image),
            NodeKind::Production(_) => None,
        }
    }

    pub fn children(&self) -> &[Node<V>] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&Node<V>> {
        self.children.get(index)
    }

    /// Append a child, growing the span to cover it.
    pub fn add_child(&mut self, child: Node<V>) {
        if self.children.is_empty() {
            self.start = child.start;
            self.span = child.span.clone();
        } else {
            self.span.end = self.span.end.max(child.span.end);
        }
        self.children.push(child);
    }

    pub fn take_children(&mut self) -> Vec<Node<V>> {
        std::mem::take(&mut self.children)
    }

    pub fn add_value(&mut self, value: V) {
        self.values.push(value);
    }

    pub fn take_values(&mut self) -> Vec<V> {
        std::mem::take(&mut self.values)
    }

    /// Values of all children, in order, leaving the children empty of them.
    pub fn take_child_values(&mut self) -> Vec<V> {
        self.children
            .iter_mut()
            .flat_map(|c| std::mem::take(&mut c.values))
            .collect()
    }
}

/// Callbacks invoked while the parser builds the tree.
///
/// Callbacks stop once a syntax error is logged; the partial tree is then
/// discarded. Synthetic productions never reach the analyzer, their children
/// are handed to the enclosing node instead.
pub trait Analyzer {
    type Value;
    type Error;

    fn enter(&mut self, _node: &mut Node<Self::Value>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Returning `None` drops the node from its parent.
    fn exit(&mut self, node: Node<Self::Value>) -> Result<Option<Node<Self::Value>>, Self::Error> {
        Ok(Some(node))
    }

    fn child(
        &mut self,
        parent: &mut Node<Self::Value>,
        child: Node<Self::Value>,
    ) -> Result<(), Self::Error> {
        parent.add_child(child);
        Ok(())
    }
}

/// Analyzer keeping the plain tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeKeeper;

impl Analyzer for TreeKeeper {
    type Value = ();
    type Error = std::convert::Infallible;
}
