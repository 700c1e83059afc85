//! LALR(1) parse table construction and the serialized table artifact.
//!
//! Tables are built from a [`Grammar`] by computing LR(0) item sets and
//! then LALR(1) lookaheads with the spontaneous/propagated method.
//! Shift/reduce conflicts resolve in favour of the shift (this is how the
//! dangling `else` binds to the nearest `if`); reduce/reduce conflicts
//! resolve to the production declared first. Every resolved conflict is
//! recorded in [`ParseTables::conflicts`].
//!
//! The tables can be written to JSON and loaded back, which lets a build
//! ship pre-generated tables instead of constructing them at start-up.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::grammar::{Grammar, Symbol};
use crate::token::TokenKind;

/// Version of the serialized table format
pub const TABLE_FORMAT_VERSION: u32 = 1;

const WORDS: usize = 4;

/// A set of terminal indices, with one extra slot used as the propagation marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TermSet([u64; WORDS]);

impl TermSet {
    fn insert(&mut self, index: usize) -> bool {
        let (word, bit) = (index / 64, 1u64 << (index % 64));
        let changed = self.0[word] & bit == 0;
        self.0[word] |= bit;
        changed
    }

    fn union(&mut self, other: &TermSet) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            let merged = *mine | *theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..WORDS * 64).filter(move |i| self.0[i / 64] & (1u64 << (i % 64)) != 0)
    }
}

/// An LR(0) item: production index and dot position
type Item = (usize, usize);

/// Decoded table entry for a state and lookahead terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAction {
    /// Shift the terminal and go to the state
    Shift(usize),
    /// Reduce by the production
    Reduce(usize),
    /// Input accepted
    Accept,
    /// Syntax error
    Error,
}

/// Kind of a resolved table conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Shift/reduce, resolved as shift
    ShiftReduce,
    /// Reduce/reduce, resolved to the earlier production
    ReduceReduce,
}

/// A conflict found (and resolved) while building the tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// State in which the conflict occurs
    pub state: usize,
    /// Terminal name of the lookahead
    pub terminal: String,
    /// Conflict kind
    pub kind: ConflictKind,
    /// The production whose reduction lost
    pub production: String,
}

/// Left-hand side and length of a production, as the driver needs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionInfo {
    /// Left-hand side non-terminal
    pub lhs: usize,
    /// Number of right-hand side symbols
    pub len: usize,
}

/// LALR(1) action and goto tables for a grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseTables {
    /// Serialized format version
    pub version: u32,
    /// Fingerprint of the grammar the tables were built from
    pub fingerprint: u64,
    /// Number of terminals (columns of the action table)
    pub terminal_count: usize,
    /// Number of non-terminals (columns of the goto table)
    pub nonterminal_count: usize,
    /// Number of states
    pub state_count: usize,
    /// `0` error, `n > 0` shift to `n - 1`, `n < 0` reduce by `-n - 1`
    action: Vec<i32>,
    /// Target state, or `-1`
    goto: Vec<i32>,
    /// Per-production reduction shape
    pub productions: Vec<ProductionInfo>,
    /// Conflicts resolved during construction
    pub conflicts: Vec<Conflict>,
}

impl ParseTables {
    /// Build LALR(1) tables for a grammar
    pub fn build(grammar: &Grammar) -> Self {
        let tables = Builder::new(grammar).build();
        tracing::debug!(
            target: "parser::tables",
            states = tables.state_count,
            productions = tables.productions.len(),
            conflicts = tables.conflicts.len(),
            "built LALR(1) tables"
        );
        tables
    }

    /// Action for a state and lookahead terminal
    pub fn action(&self, state: usize, terminal: TokenKind) -> ParseAction {
        let cell = self
            .action
            .get(state * self.terminal_count + terminal as usize)
            .copied()
            .unwrap_or(0);
        match cell {
            0 => ParseAction::Error,
            -1 => ParseAction::Accept,
            n if n > 0 => ParseAction::Shift((n - 1) as usize),
            n => ParseAction::Reduce((-n - 1) as usize),
        }
    }

    /// Goto state after reducing to a non-terminal
    pub fn goto(&self, state: usize, nonterminal: usize) -> Option<usize> {
        match self.goto.get(state * self.nonterminal_count + nonterminal) {
            Some(&target) if target >= 0 => Some(target as usize),
            _ => None,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load from JSON, validating the table shape
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let tables: ParseTables = serde_json::from_str(json)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Write the JSON artifact to a file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a JSON artifact from a file
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), TableError> {
        if self.version != TABLE_FORMAT_VERSION {
            return Err(TableError::UnsupportedVersion(self.version));
        }
        if self.terminal_count != TokenKind::ALL.len() {
            return Err(TableError::Malformed(format!(
                "expected {} terminals, found {}",
                TokenKind::ALL.len(),
                self.terminal_count
            )));
        }
        if self.action.len() != self.state_count * self.terminal_count {
            return Err(TableError::Malformed("action table has the wrong size".into()));
        }
        if self.goto.len() != self.state_count * self.nonterminal_count {
            return Err(TableError::Malformed("goto table has the wrong size".into()));
        }
        let states = self.state_count as i64;
        let productions = self.productions.len() as i64;
        for &cell in &self.action {
            let cell = i64::from(cell);
            if cell > states || -cell > productions {
                return Err(TableError::Malformed(format!("action entry {} out of range", cell)));
            }
        }
        if self.goto.iter().any(|&t| i64::from(t) >= states || t < -1) {
            return Err(TableError::Malformed("goto entry out of range".into()));
        }
        if self
            .productions
            .iter()
            .any(|p| p.lhs >= self.nonterminal_count)
        {
            return Err(TableError::Malformed("production lhs out of range".into()));
        }
        Ok(())
    }
}

struct Builder<'g> {
    grammar: &'g Grammar,
    terminals: usize,
    marker: usize,
    by_lhs: Vec<Vec<usize>>,
    /// FIRST set and nullability of every production suffix `rhs[i..]`
    suffix: Vec<Vec<(TermSet, bool)>>,
    kernels: Vec<Vec<Item>>,
    /// Outgoing transitions per state, sorted by symbol key
    transitions: Vec<Vec<(usize, usize)>>,
}

impl<'g> Builder<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let terminals = TokenKind::ALL.len();
        let mut by_lhs = vec![Vec::new(); grammar.nonterminal_count()];
        for (index, production) in grammar.productions().iter().enumerate() {
            by_lhs[production.lhs].push(index);
        }
        let mut builder = Self {
            grammar,
            terminals,
            marker: terminals,
            by_lhs,
            suffix: Vec::new(),
            kernels: Vec::new(),
            transitions: Vec::new(),
        };
        builder.compute_first();
        builder
    }

    fn rhs(&self, production: usize) -> &[Symbol] {
        &self.grammar.productions()[production].rhs
    }

    fn key(&self, symbol: Symbol) -> usize {
        match symbol {
            Symbol::Terminal(kind) => kind as usize,
            Symbol::NonTerminal(n) => self.terminals + n,
        }
    }

    fn compute_first(&mut self) {
        let count = self.grammar.nonterminal_count();
        let mut nullable = vec![false; count];
        let mut first = vec![TermSet::default(); count];

        let mut changed = true;
        while changed {
            changed = false;
            for production in self.grammar.productions() {
                let lhs = production.lhs;
                let mut all_nullable = true;
                for symbol in &production.rhs {
                    match *symbol {
                        Symbol::Terminal(kind) => {
                            changed |= first[lhs].insert(kind as usize);
                            all_nullable = false;
                        }
                        Symbol::NonTerminal(n) => {
                            let inner = first[n];
                            changed |= first[lhs].union(&inner);
                            all_nullable = nullable[n];
                        }
                    }
                    if !all_nullable {
                        break;
                    }
                }
                if all_nullable && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
        }

        self.suffix = self
            .grammar
            .productions()
            .iter()
            .map(|production| {
                let mut suffix = vec![(TermSet::default(), true); production.rhs.len() + 1];
                for i in (0..production.rhs.len()).rev() {
                    suffix[i] = match production.rhs[i] {
                        Symbol::Terminal(kind) => {
                            let mut set = TermSet::default();
                            set.insert(kind as usize);
                            (set, false)
                        }
                        Symbol::NonTerminal(n) => {
                            let mut set = first[n];
                            if nullable[n] {
                                set.union(&suffix[i + 1].0);
                            }
                            (set, nullable[n] && suffix[i + 1].1)
                        }
                    };
                }
                suffix
            })
            .collect();
    }

    fn closure0(&self, kernel: &[Item]) -> Vec<Item> {
        let mut items = kernel.to_vec();
        let mut expanded = vec![false; self.grammar.nonterminal_count()];
        let mut i = 0;
        while i < items.len() {
            let (p, d) = items[i];
            if let Some(Symbol::NonTerminal(n)) = self.rhs(p).get(d) {
                if !expanded[*n] {
                    expanded[*n] = true;
                    items.extend(self.by_lhs[*n].iter().map(|&q| (q, 0)));
                }
            }
            i += 1;
        }
        items
    }

    fn build_states(&mut self) {
        let mut index: HashMap<Vec<Item>, usize> = HashMap::new();
        self.kernels.push(vec![(0, 0)]);
        index.insert(vec![(0, 0)], 0);

        let mut state = 0;
        while state < self.kernels.len() {
            let mut groups: BTreeMap<usize, Vec<Item>> = BTreeMap::new();
            for (p, d) in self.closure0(&self.kernels[state]) {
                if let Some(&symbol) = self.rhs(p).get(d) {
                    groups.entry(self.key(symbol)).or_default().push((p, d + 1));
                }
            }

            let mut transitions = Vec::with_capacity(groups.len());
            for (key, mut kernel) in groups {
                kernel.sort_unstable();
                kernel.dedup();
                let target = match index.get(&kernel) {
                    Some(&target) => target,
                    None => {
                        let target = self.kernels.len();
                        index.insert(kernel.clone(), target);
                        self.kernels.push(kernel);
                        target
                    }
                };
                transitions.push((key, target));
            }
            self.transitions.push(transitions);
            state += 1;
        }
    }

    /// LR(1) closure of seeded items; non-kernel items all have the dot at 0
    fn closure1(&self, seeds: &[(Item, TermSet)]) -> Vec<(Item, TermSet)> {
        let count = self.grammar.productions().len();
        let mut lookahead = vec![TermSet::default(); count];
        let mut present = vec![false; count];
        let mut pending: Vec<(Item, TermSet)> = seeds.to_vec();

        while let Some(((p, d), set)) = pending.pop() {
            if let Some(Symbol::NonTerminal(b)) = self.rhs(p).get(d) {
                let (first, nullable) = &self.suffix[p][d + 1];
                let mut added = *first;
                if *nullable {
                    added.union(&set);
                }
                for &q in &self.by_lhs[*b] {
                    let changed = lookahead[q].union(&added);
                    if changed || !present[q] {
                        present[q] = true;
                        pending.push(((q, 0), lookahead[q]));
                    }
                }
            }
        }

        let mut items = seeds.to_vec();
        items.extend(
            (0..count)
                .filter(|&q| present[q])
                .map(|q| ((q, 0), lookahead[q])),
        );
        items
    }

    fn target(&self, state: usize, key: usize) -> Option<usize> {
        let transitions = &self.transitions[state];
        transitions
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .map(|i| transitions[i].1)
    }

    fn lookaheads(&self) -> Vec<Vec<TermSet>> {
        let mut lookaheads: Vec<Vec<TermSet>> = self
            .kernels
            .iter()
            .map(|kernel| vec![TermSet::default(); kernel.len()])
            .collect();
        let mut links: Vec<Vec<Vec<(usize, usize)>>> = self
            .kernels
            .iter()
            .map(|kernel| vec![Vec::new(); kernel.len()])
            .collect();
        lookaheads[0][0].insert(TokenKind::Eof as usize);

        let mut marker = TermSet::default();
        marker.insert(self.marker);
        for (state, kernel) in self.kernels.iter().enumerate() {
            for (k, &item) in kernel.iter().enumerate() {
                for ((p, d), set) in self.closure1(&[(item, marker)]) {
                    let Some(&symbol) = self.rhs(p).get(d) else {
                        continue;
                    };
                    let Some(target) = self.target(state, self.key(symbol)) else {
                        continue;
                    };
                    let Ok(tk) = self.kernels[target].binary_search(&(p, d + 1)) else {
                        continue;
                    };
                    for terminal in set.iter() {
                        if terminal == self.marker {
                            links[state][k].push((target, tk));
                        } else {
                            lookaheads[target][tk].insert(terminal);
                        }
                    }
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for (state, kernel_links) in links.iter().enumerate() {
                for (k, targets) in kernel_links.iter().enumerate() {
                    let set = lookaheads[state][k];
                    for &(target, tk) in targets {
                        changed |= lookaheads[target][tk].union(&set);
                    }
                }
            }
        }
        lookaheads
    }

    fn build(mut self) -> ParseTables {
        self.build_states();
        let lookaheads = self.lookaheads();

        let terminals = self.terminals;
        let nonterminals = self.grammar.nonterminal_count();
        let states = self.kernels.len();
        let mut action = vec![0i32; states * terminals];
        let mut goto = vec![-1i32; states * nonterminals];
        let mut conflicts = Vec::new();

        for state in 0..states {
            for &(key, target) in &self.transitions[state] {
                if key < terminals {
                    action[state * terminals + key] = target as i32 + 1;
                } else {
                    goto[state * nonterminals + key - terminals] = target as i32;
                }
            }

            let seeds: Vec<(Item, TermSet)> = self.kernels[state]
                .iter()
                .copied()
                .zip(lookaheads[state].iter().copied())
                .collect();
            for ((p, d), set) in self.closure1(&seeds) {
                if d != self.rhs(p).len() {
                    continue;
                }
                for terminal in set.iter().filter(|&t| t < terminals) {
                    let cell = &mut action[state * terminals + terminal];
                    let conflict = match *cell {
                        0 => {
                            *cell = -(p as i32) - 1;
                            None
                        }
                        c if c > 0 => Some((ConflictKind::ShiftReduce, p)),
                        c => {
                            let existing = (-c - 1) as usize;
                            if existing == p {
                                None
                            } else {
                                *cell = -(existing.min(p) as i32) - 1;
                                Some((ConflictKind::ReduceReduce, existing.max(p)))
                            }
                        }
                    };
                    if let Some((kind, loser)) = conflict {
                        conflicts.push(Conflict {
                            state,
                            terminal: TokenKind::ALL[terminal].name().to_string(),
                            kind,
                            production: self.grammar.productions()[loser].text.clone(),
                        });
                    }
                }
            }
        }

        ParseTables {
            version: TABLE_FORMAT_VERSION,
            fingerprint: self.grammar.fingerprint(),
            terminal_count: terminals,
            nonterminal_count: nonterminals,
            state_count: states,
            action,
            goto,
            productions: self
                .grammar
                .productions()
                .iter()
                .map(|p| ProductionInfo {
                    lhs: p.lhs,
                    len: p.rhs.len(),
                })
                .collect(),
            conflicts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{list_append_separated, list_start, pass};

    /// `list: item | list COMMA item; item: ID | LPAREN list RPAREN`
    fn list_grammar() -> Grammar {
        let mut g = Grammar::builder();
        g.rule("list", "item", list_start)
            .rule("list", "list COMMA item", list_append_separated)
            .rule("item", "ID", pass)
            .rule("item", "LPAREN list RPAREN", pass);
        g.build("list").unwrap()
    }

    #[test]
    fn test_termset() {
        let mut set = TermSet::default();
        assert!(set.insert(3));
        assert!(!set.insert(3));
        set.insert(130);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 130]);
    }

    #[test]
    fn test_small_grammar_has_no_conflicts() {
        let tables = ParseTables::build(&list_grammar());
        assert!(tables.conflicts.is_empty());
        assert!(matches!(tables.action(0, TokenKind::Id), ParseAction::Shift(_)));
        assert_eq!(tables.action(0, TokenKind::Comma), ParseAction::Error);
    }

    #[test]
    fn test_accept_after_start_symbol() {
        let grammar = list_grammar();
        let tables = ParseTables::build(&grammar);
        let list = grammar.nonterminal("list").unwrap();
        let state = tables.goto(0, list).unwrap();
        assert_eq!(tables.action(state, TokenKind::Eof), ParseAction::Accept);
        assert!(matches!(tables.action(state, TokenKind::Comma), ParseAction::Shift(_)));
    }

    #[test]
    fn test_reduce_on_follow_only() {
        let grammar = list_grammar();
        let tables = ParseTables::build(&grammar);
        let ParseAction::Shift(after_id) = tables.action(0, TokenKind::Id) else {
            panic!("expected shift");
        };
        assert_eq!(tables.action(after_id, TokenKind::Comma), ParseAction::Reduce(3));
        assert_eq!(tables.action(after_id, TokenKind::Eof), ParseAction::Reduce(3));
        assert_eq!(tables.action(after_id, TokenKind::Id), ParseAction::Error);
    }

    #[test]
    fn test_nullable_lookahead_propagates() {
        // opt: ε | ID ; start: opt SEMI
        let mut g = Grammar::builder();
        g.rule("start", "opt SEMI", pass)
            .rule("opt", "", pass)
            .rule("opt", "ID", pass);
        let grammar = g.build("start").unwrap();
        let tables = ParseTables::build(&grammar);
        assert_eq!(tables.action(0, TokenKind::Semi), ParseAction::Reduce(2));
        assert!(tables.conflicts.is_empty());
    }

    #[test]
    fn test_dangling_else_shifts() {
        let mut g = Grammar::builder();
        g.rule("stmt", "IF LPAREN ID RPAREN stmt", pass)
            .rule("stmt", "IF LPAREN ID RPAREN stmt ELSE stmt", pass)
            .rule("stmt", "SEMI", pass);
        let tables = ParseTables::build(&g.build("stmt").unwrap());
        assert_eq!(tables.conflicts.len(), 1);
        assert_eq!(tables.conflicts[0].kind, ConflictKind::ShiftReduce);
        assert_eq!(tables.conflicts[0].terminal, "ELSE");
    }

    #[test]
    fn test_json_round_trip() {
        let tables = ParseTables::build(&list_grammar());
        let loaded = ParseTables::from_json(&tables.to_json().unwrap()).unwrap();
        assert_eq!(loaded, tables);
    }

    #[test]
    fn test_rejects_other_version() {
        let mut tables = ParseTables::build(&list_grammar());
        tables.version = 99;
        let json = serde_json::to_string(&tables).unwrap();
        assert!(matches!(
            ParseTables::from_json(&json),
            Err(TableError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_rejects_truncated_tables() {
        let mut tables = ParseTables::build(&list_grammar());
        tables.action.pop();
        let json = serde_json::to_string(&tables).unwrap();
        assert!(matches!(
            ParseTables::from_json(&json),
            Err(TableError::Malformed(_))
        ));
    }
}
