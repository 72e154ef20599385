//! Minimal basic-graph-pattern evaluation over a triple store.
//!
//! A query is a sequence of triple patterns separated by `.`; each term is
//! a variable (`?dept`), a resource (`<http://ex.org/u1>`), or a literal
//! (`"Chair"`). Patterns are joined left to right against the store.

use crate::{
    errors::GraphLoomError,
    store::SqliteTripleStore,
    value::{Binding, GraphValue},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Variable(String),
    Value(GraphValue),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

pub fn parse_bgp(text: &str) -> Result<Vec<TriplePattern>, GraphLoomError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(GraphLoomError::query("empty query text"));
    }
    let mut patterns = Vec::new();
    let mut current: Vec<Term> = Vec::new();
    for token in tokens {
        match token {
            Token::Separator => {
                if !current.is_empty() {
                    patterns.push(pattern_from_terms(&mut current)?);
                }
            }
            Token::Term(term) => current.push(term),
        }
    }
    if !current.is_empty() {
        patterns.push(pattern_from_terms(&mut current)?);
    }
    if patterns.is_empty() {
        return Err(GraphLoomError::query("query has no triple patterns"));
    }
    Ok(patterns)
}

/// Distinct variables referenced by the query text, in first-appearance
/// order. Used for dependency metadata and dynamic rewriting.
pub fn query_variables(text: &str) -> Result<Vec<String>, GraphLoomError> {
    let patterns = parse_bgp(text)?;
    let mut names: Vec<String> = Vec::new();
    for pattern in &patterns {
        for term in [&pattern.subject, &pattern.predicate, &pattern.object] {
            if let Term::Variable(name) = term {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
        }
    }
    Ok(names)
}

pub fn execute_bgp(
    store: &SqliteTripleStore,
    text: &str,
) -> Result<Vec<Binding>, GraphLoomError> {
    let patterns = parse_bgp(text)?;
    let mut bindings = vec![Binding::new()];
    for pattern in &patterns {
        let mut extended = Vec::new();
        for binding in &bindings {
            let subject = resolve_subject(&pattern.subject, binding)?;
            let predicate = resolve_predicate(&pattern.predicate, binding)?;
            let object = resolve_object(&pattern.object, binding);
            let candidates = store.fetch_triples(
                subject.as_deref(),
                predicate.as_deref(),
                object.as_ref(),
            )?;
            for triple in candidates {
                let mut next = binding.clone();
                if let Term::Variable(name) = &pattern.subject {
                    if !next.contains(name) {
                        next.set(name.clone(), GraphValue::resource(triple.subject.clone()));
                    }
                }
                if let Term::Variable(name) = &pattern.predicate {
                    if !next.contains(name) {
                        next.set(name.clone(), GraphValue::resource(triple.predicate.clone()));
                    }
                }
                if let Term::Variable(name) = &pattern.object {
                    if !next.contains(name) {
                        next.set(name.clone(), triple.object.clone());
                    }
                }
                extended.push(next);
            }
        }
        if extended.is_empty() {
            return Ok(Vec::new());
        }
        bindings = extended;
    }
    Ok(bindings)
}

fn resolve_subject(term: &Term, binding: &Binding) -> Result<Option<String>, GraphLoomError> {
    match resolved_value(term, binding) {
        Some(GraphValue::Resource(iri)) => Ok(Some(iri.clone())),
        Some(GraphValue::Literal(_)) => Err(GraphLoomError::query(
            "literal cannot appear in subject position",
        )),
        None => Ok(None),
    }
}

fn resolve_predicate(term: &Term, binding: &Binding) -> Result<Option<String>, GraphLoomError> {
    match resolved_value(term, binding) {
        Some(GraphValue::Resource(iri)) => Ok(Some(iri.clone())),
        Some(GraphValue::Literal(_)) => Err(GraphLoomError::query(
            "literal cannot appear in predicate position",
        )),
        None => Ok(None),
    }
}

fn resolve_object(term: &Term, binding: &Binding) -> Option<GraphValue> {
    resolved_value(term, binding).cloned()
}

fn resolved_value<'a>(term: &'a Term, binding: &'a Binding) -> Option<&'a GraphValue> {
    match term {
        Term::Value(value) => Some(value),
        Term::Variable(name) => binding.get(name),
    }
}

enum Token {
    Term(Term),
    Separator,
}

fn tokenize(text: &str) -> Result<Vec<Token>, GraphLoomError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                chars.next();
                tokens.push(Token::Separator);
            }
            '?' => {
                chars.next();
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(GraphLoomError::query("variable name missing after '?'"));
                }
                tokens.push(Token::Term(Term::Variable(name)));
            }
            '<' => {
                chars.next();
                let mut iri = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '>' {
                        closed = true;
                        break;
                    }
                    iri.push(c);
                }
                if !closed {
                    return Err(GraphLoomError::query("unterminated IRI term"));
                }
                tokens.push(Token::Term(Term::Value(GraphValue::Resource(iri))));
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(GraphLoomError::query("unterminated literal term"));
                }
                tokens.push(Token::Term(Term::Value(GraphValue::Literal(text))));
            }
            other => {
                return Err(GraphLoomError::query(format!(
                    "unexpected character '{other}' in query text"
                )));
            }
        }
    }
    Ok(tokens)
}

fn pattern_from_terms(terms: &mut Vec<Term>) -> Result<TriplePattern, GraphLoomError> {
    if terms.len() != 3 {
        return Err(GraphLoomError::query(format!(
            "triple pattern needs exactly 3 terms, found {}",
            terms.len()
        )));
    }
    let object = terms.pop().expect("object term");
    let predicate = terms.pop().expect("predicate term");
    let subject = terms.pop().expect("subject term");
    if matches!(subject, Term::Value(GraphValue::Literal(_))) {
        return Err(GraphLoomError::query(
            "literal cannot appear in subject position",
        ));
    }
    Ok(TriplePattern {
        subject,
        predicate,
        object,
    })
}
