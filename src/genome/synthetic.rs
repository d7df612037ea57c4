//! Synthetic genomes for experiments
//!
//! The owner's genome carries `'T'` on `[start, end]` and `'A'` elsewhere; a
//! query carries `'T'` on `[start, end]` only. In SNP mode positions are spaced
//! [`SNP_GAP`] apart instead of being contiguous.

use super::Base;

/// Distance between consecutive SNP positions
pub const SNP_GAP: u32 = 1000;

fn gap(snp: bool) -> u32 {
    if snp {
        SNP_GAP
    } else {
        1
    }
}

/// Owner genome over positions `gap, 2*gap, ..., <= size`
pub fn owner_genome(size: u32, start: u32, end: u32, snp: bool) -> Vec<Base> {
    let gap = gap(snp);
    (1..=size / gap)
        .map(|i| {
            let position = i * gap;
            let symbol = if position < start || position > end { b'A' } else { b'T' };
            Base::new(position, symbol)
        })
        .collect()
}

/// Query marker covering the `'T'` run on `[start, end]`
pub fn query_genome(start: u32, end: u32, snp: bool) -> Vec<Base> {
    let gap = gap(snp);
    (1..=end / gap)
        .map(|i| i * gap)
        .filter(|&position| position >= start)
        .map(|position| Base::new(position, b'T'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::ensure_strictly_increasing;

    #[test]
    fn test_owner_genome_whole() {
        let genome = owner_genome(10, 4, 6, false);
        assert_eq!(genome.len(), 10);
        assert_eq!(genome[0], Base::new(1, b'A'));
        assert_eq!(genome[3], Base::new(4, b'T'));
        assert_eq!(genome[5], Base::new(6, b'T'));
        assert_eq!(genome[6], Base::new(7, b'A'));
        assert!(ensure_strictly_increasing(&genome).is_ok());
    }

    #[test]
    fn test_owner_genome_snp() {
        let genome = owner_genome(10_000, 3000, 5000, true);
        assert_eq!(genome.len(), 10);
        assert_eq!(genome[0].position, 1000);
        assert_eq!(genome.iter().filter(|b| b.symbol == b'T').count(), 3);
    }

    #[test]
    fn test_query_genome() {
        let query = query_genome(4, 6, false);
        assert_eq!(query, vec![Base::new(4, b'T'), Base::new(5, b'T'), Base::new(6, b'T')]);

        let snp_query = query_genome(2500, 5000, true);
        let positions: Vec<u32> = snp_query.iter().map(|b| b.position).collect();
        assert_eq!(positions, vec![3000, 4000, 5000]);
    }
}
