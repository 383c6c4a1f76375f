//! Semantic-tokens decoding and the `DocumentSymbol` + token merge step:
//! for every symbol, collect the semantic tokens whose range lies inside
//! the symbol's own range.

use lsp_types::{DocumentSymbol, Position, Range, SemanticTokensLegend};

use crate::spec::{Symbol, Token};

/// Decode the flat, delta-encoded `data` array the LSP returns for
/// `semanticTokens/full` into absolute-positioned tokens.
pub fn decode_semantic_tokens(data: &[u32], legend: &SemanticTokensLegend) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(data.len() / 5);
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;

    for chunk in data.chunks_exact(5) {
        let [delta_line, delta_start, length, type_idx, modifiers_bitset] = chunk else {
            continue;
        };
        let line = prev_line + delta_line;
        let start = if *delta_line == 0 { prev_start + delta_start } else { *delta_start };
        prev_line = line;
        prev_start = start;

        let token_type = legend
            .token_types
            .get(*type_idx as usize)
            .map(|t| t.as_str().to_string())
            .unwrap_or_default();
        let modifiers = legend
            .token_modifiers
            .iter()
            .enumerate()
            .filter(|(bit, _)| modifiers_bitset & (1 << bit) != 0)
            .map(|(_, name)| name.as_str().to_string())
            .collect();

        tokens.push(Token {
            range: Range {
                start: Position { line, character: start },
                end: Position {
                    line,
                    character: start + length,
                },
            },
            token_type,
            modifiers,
        });
    }
    tokens
}

fn range_contains(outer: &Range, inner: &Range) -> bool {
    (outer.start.line, outer.start.character) <= (inner.start.line, inner.start.character)
        && (inner.end.line, inner.end.character) <= (outer.end.line, outer.end.character)
}

/// Convert the LSP's hierarchical `DocumentSymbol` tree into our own
/// `Symbol` tree, attaching every semantic token whose range lies inside
/// each symbol's range.
pub fn build_symbol_tree(doc_symbols: &[DocumentSymbol], tokens: &[Token]) -> Vec<Symbol> {
    doc_symbols.iter().map(|sym| build_symbol(sym, tokens)).collect()
}

fn build_symbol(doc: &DocumentSymbol, tokens: &[Token]) -> Symbol {
    let own_tokens: Vec<Token> = tokens.iter().filter(|t| range_contains(&doc.range, &t.range)).cloned().collect();
    let children = doc
        .children
        .as_ref()
        .map(|kids| build_symbol_tree(kids, tokens))
        .unwrap_or_default();
    Symbol {
        name: doc.name.clone(),
        detail: doc.detail.clone(),
        kind: doc.kind,
        range: doc.range,
        selection_range: doc.selection_range,
        children,
        tokens: own_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legend() -> SemanticTokensLegend {
        SemanticTokensLegend {
            token_types: vec!["function".into(), "variable".into()],
            token_modifiers: vec!["declaration".into(), "defaultLibrary".into()],
        }
    }

    #[test]
    fn decodes_single_token() {
        let data = vec![0, 0, 3, 0, 0b01];
        let tokens = decode_semantic_tokens(&data, &legend());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, "function");
        assert!(tokens[0].has_modifier("declaration"));
        assert_eq!(tokens[0].range.start.character, 0);
        assert_eq!(tokens[0].range.end.character, 3);
    }

    #[test]
    fn accumulates_deltas_across_tokens() {
        let data = vec![0, 0, 3, 0, 0, 0, 5, 1, 0];
        let tokens = decode_semantic_tokens(&data, &legend());
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].range.start.character, 8);
        assert_eq!(tokens[1].token_type, "variable");
    }
}
