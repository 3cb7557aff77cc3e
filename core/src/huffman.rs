//! Prefix-free character coding: textbook Huffman trees and the simpler
//! frequency-rank scheme used in the classroom demo.

use crate::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodingScheme {
    /// Repeatedly merge the two lightest subtrees; optimal code lengths.
    #[default]
    Huffman,
    /// The k-th most frequent symbol gets `k` ones followed by a zero; the
    /// least frequent drops the trailing zero.
    RankBased,
}

impl FromStr for CodingScheme {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "huffman" => Ok(CodingScheme::Huffman),
            "rank-based" | "rank" => Ok(CodingScheme::RankBased),
            other => Err(LabError::UnknownScheme(other.to_string())),
        }
    }
}

pub fn frequencies(text: &str) -> BTreeMap<char, usize> {
    let mut freqs = BTreeMap::new();
    for c in text.chars() {
        *freqs.entry(c).or_insert(0) += 1;
    }
    freqs
}

/// Symbols ordered from least to most frequent, ties by character.
fn ascending_by_weight(freqs: &BTreeMap<char, usize>) -> Vec<(char, usize)> {
    let mut symbols: Vec<(char, usize)> = freqs.iter().map(|(&c, &f)| (c, f)).collect();
    symbols.sort_by_key(|&(c, f)| (f, c));
    symbols
}

enum Node {
    Leaf(char),
    Internal(usize, usize),
}

fn huffman_codes(freqs: &BTreeMap<char, usize>) -> BTreeMap<char, String> {
    let symbols = ascending_by_weight(freqs);
    match symbols.as_slice() {
        [] => return BTreeMap::new(),
        [(only, _)] => return BTreeMap::from([(*only, "0".to_string())]),
        [(light, _), (heavy, _)] => {
            return BTreeMap::from([(*light, "0".to_string()), (*heavy, "1".to_string())])
        }
        _ => {}
    }

    // Node indices double as tie-breakers, so equal weights merge in creation order.
    let mut nodes: Vec<Node> = Vec::with_capacity(symbols.len() * 2);
    let mut heap: BinaryHeap<Reverse<(usize, usize)>> = BinaryHeap::with_capacity(symbols.len());
    for (c, f) in symbols {
        heap.push(Reverse((f, nodes.len())));
        nodes.push(Node::Leaf(c));
    }
    while heap.len() > 1 {
        let (Some(Reverse((wa, a))), Some(Reverse((wb, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        heap.push(Reverse((wa + wb, nodes.len())));
        nodes.push(Node::Internal(a, b));
    }
    let root = nodes.len() - 1;

    let mut codes = BTreeMap::new();
    let mut stack = vec![(root, String::new())];
    while let Some((idx, prefix)) = stack.pop() {
        match nodes[idx] {
            Node::Leaf(c) => {
                codes.insert(c, prefix);
            }
            Node::Internal(left, right) => {
                stack.push((right, format!("{prefix}1")));
                stack.push((left, format!("{prefix}0")));
            }
        }
    }
    codes
}

fn rank_codes(freqs: &BTreeMap<char, usize>) -> BTreeMap<char, String> {
    let mut symbols: Vec<(char, usize)> = freqs.iter().map(|(&c, &f)| (c, f)).collect();
    symbols.sort_by_key(|&(c, f)| (Reverse(f), c));
    let last = symbols.len().saturating_sub(1);
    symbols
        .into_iter()
        .enumerate()
        .map(|(rank, (c, _))| {
            let mut code = "1".repeat(rank);
            if rank < last || last == 0 {
                code.push('0');
            }
            (c, code)
        })
        .collect()
}

/// Character → bit-string mapping in which no code is a prefix of another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeTable {
    codes: BTreeMap<char, String>,
}

impl CodeTable {
    pub fn build(freqs: &BTreeMap<char, usize>, scheme: CodingScheme) -> Self {
        let codes = match scheme {
            CodingScheme::Huffman => huffman_codes(freqs),
            CodingScheme::RankBased => rank_codes(freqs),
        };
        Self { codes }
    }

    /// Accept a caller-supplied table after checking it is binary and prefix-free.
    pub fn from_codes(codes: BTreeMap<char, String>) -> Result<Self> {
        for (c, code) in &codes {
            if code.is_empty() || !code.chars().all(|b| b == '0' || b == '1') {
                return Err(LabError::InvalidCodeTable(format!("code {code:?} for {c:?} is not a non-empty bit string")));
            }
        }
        let mut sorted: Vec<&String> = codes.values().collect();
        sorted.sort();
        for pair in sorted.windows(2) {
            if pair[1].starts_with(pair[0].as_str()) {
                return Err(LabError::InvalidCodeTable(format!("{} is a prefix of {}", pair[0], pair[1])));
            }
        }
        Ok(Self { codes })
    }

    pub fn code(&self, c: char) -> Option<&str> {
        self.codes.get(&c).map(String::as_str)
    }

    pub fn codes(&self) -> &BTreeMap<char, String> {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn encode(&self, text: &str) -> Result<String> {
        let mut bits = String::new();
        for c in text.chars() {
            bits.push_str(self.code(c).ok_or(LabError::UnencodableChar(c))?);
        }
        Ok(bits)
    }

    pub fn decode(&self, bits: &str) -> Result<String> {
        let reverse: HashMap<&str, char> = self.codes.iter().map(|(&c, code)| (code.as_str(), c)).collect();
        let max_len = self.codes.values().map(String::len).max().unwrap_or(0);

        let mut out = String::new();
        let mut pending = String::new();
        for (i, b) in bits.chars().enumerate() {
            if b != '0' && b != '1' {
                return Err(LabError::InvalidBitstring(format!("non-binary character {b:?} at offset {i}")));
            }
            pending.push(b);
            if let Some(&c) = reverse.get(pending.as_str()) {
                out.push(c);
                pending.clear();
            } else if pending.len() >= max_len {
                return Err(LabError::InvalidBitstring(format!("no code matches {pending} ending at offset {i}")));
            }
        }
        if !pending.is_empty() {
            return Err(LabError::InvalidBitstring(format!("trailing bits {pending}")));
        }
        Ok(out)
    }

    /// Total encoded length, in bits, of a text with these symbol counts.
    pub fn encoded_len(&self, freqs: &BTreeMap<char, usize>) -> usize {
        freqs
            .iter()
            .map(|(c, f)| self.code(*c).map_or(0, str::len) * f)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub frequencies: BTreeMap<char, usize>,
    pub table: CodeTable,
    pub bits: String,
}

impl Encoding {
    /// Size of the input at eight bits per character.
    pub fn original_bits(&self) -> usize {
        8 * self.frequencies.values().sum::<usize>()
    }

    pub fn encoded_bits(&self) -> usize {
        self.bits.len()
    }
}

/// Count, build a table with `scheme`, and encode `text` with it.
pub fn encode(text: &str, scheme: CodingScheme) -> Encoding {
    let frequencies = frequencies(text);
    let table = CodeTable::build(&frequencies, scheme);
    let bits = text
        .chars()
        .filter_map(|c| table.code(c))
        .collect::<String>();
    tracing::debug!(symbols = table.len(), bits = bits.len(), ?scheme, "encoded text");
    Encoding { frequencies, table, bits }
}
