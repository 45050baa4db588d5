use crate::types::ResolvedAddress;

/// Deduplicate by case-folded address, keeping first-seen order and the
/// checksummed form of the first occurrence.
pub fn dedup_addresses(resolved: &[ResolvedAddress]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for entry in resolved {
        if seen.insert(entry.address.to_lowercase()) {
            out.push(entry.address.clone());
        }
    }
    out
}

/// Partition into fixed-size chunks; the last chunk holds the remainder.
/// A zero size is treated as one.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items
        .chunks(size.max(1))
        .map(|part| part.to_vec())
        .collect()
}

/// One address per line, suffixed with `,amount` when `amount` is non-zero.
/// The zero-amount form is what disperse.app's plain address list expects.
pub fn render_recipient_lines(addresses: &[String], amount: u64) -> String {
    addresses
        .iter()
        .map(|addr| {
            if amount > 0 {
                format!("{addr},{amount}")
            } else {
                addr.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One bracketed comma-joined array literal per chunk, newline-delimited.
/// Paste-ready for etherscan's batch write input.
pub fn render_bracketed_chunks(chunks: &[Vec<String>]) -> String {
    chunks
        .iter()
        .map(|part| format!("[{}]", part.join(",")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full stdout report: recipient lines, a blank separator, then the bracketed
/// chunks. An empty address list renders nothing at all, so paste targets
/// never see stray newlines.
pub fn render_report(addresses: &[String], amount: u64, chunk_size: usize) -> String {
    if addresses.is_empty() {
        return String::new();
    }
    format!(
        "{}\n\n{}",
        render_recipient_lines(addresses, amount),
        render_bracketed_chunks(&chunk(addresses, chunk_size))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(address: &str) -> ResolvedAddress {
        ResolvedAddress {
            address: address.to_string(),
            name: None,
            source_text: String::new(),
        }
    }

    const A: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const B: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

    #[test]
    fn dedup_keeps_first_seen_order() {
        let list = [resolved(A), resolved(A), resolved(B)];
        assert_eq!(dedup_addresses(&list), [A, B]);
    }

    #[test]
    fn dedup_is_case_insensitive() {
        let list = [resolved(A), resolved(&A.to_lowercase()), resolved(B)];
        assert_eq!(dedup_addresses(&list), [A, B]);
    }

    #[test]
    fn chunk_sizes() {
        let items: Vec<u32> = (0..250).collect();
        let chunks = chunk(&items, 100);
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, [100, 100, 50]);
        assert_eq!(chunks[2][49], 249);
    }

    #[test]
    fn chunk_zero_size_is_one() {
        let items = [1, 2, 3];
        assert_eq!(chunk(&items, 0).len(), 3);
    }

    #[test]
    fn recipient_lines_with_amount() {
        let addrs = [A.to_string(), B.to_string()];
        assert_eq!(
            render_recipient_lines(&addrs, 10),
            format!("{A},10\n{B},10")
        );
    }

    #[test]
    fn recipient_lines_zero_amount_omits_suffix() {
        let addrs = [A.to_string()];
        assert_eq!(render_recipient_lines(&addrs, 0), A);
    }

    #[test]
    fn report_composes_both_renderings() {
        let addrs = [A.to_string(), B.to_string()];
        assert_eq!(
            render_report(&addrs, 10, 1),
            format!("{A},10\n{B},10\n\n[{A}]\n[{B}]")
        );
    }

    #[test]
    fn report_empty_renders_nothing() {
        assert_eq!(render_report(&[], 10, 100), "");
    }

    #[test]
    fn bracketed_chunks() {
        let chunks = vec![
            vec![A.to_string(), B.to_string()],
            vec![A.to_string()],
        ];
        assert_eq!(
            render_bracketed_chunks(&chunks),
            format!("[{A},{B}]\n[{A}]")
        );
    }
}
