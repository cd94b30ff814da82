use partyapp_core::model::id::{encode_base32, generate_id, generate_id_at, ID_ALPHABET, ID_LEN};
use partyapp_core::is_valid_id;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

#[test]
fn ids_with_equal_prefix_width_sort_by_time() {
    let mut rng = StdRng::seed_from_u64(7);
    // 2024-01-01 through 2030-01-01 all encode to nine symbols.
    let start: u128 = 1_704_067_200_000;
    let end: u128 = 1_893_456_000_000;
    assert_eq!(encode_base32(start).len(), encode_base32(end).len());

    let step = (end - start) / 500;
    let mut previous = generate_id_at(start, &mut rng);
    let mut millis = start + step;
    while millis <= end {
        let next = generate_id_at(millis, &mut rng);
        assert!(previous < next, "{previous} should sort before {next}");
        previous = next;
        millis += step;
    }
}

#[test]
fn prefix_is_the_unpadded_millisecond_encoding() {
    let mut rng = StdRng::seed_from_u64(1);
    let id = generate_id_at(1_704_067_200_000, &mut rng);
    assert!(id.starts_with(&encode_base32(1_704_067_200_000)));
    assert_eq!(id.len(), ID_LEN);
}

#[test]
fn generated_ids_are_well_formed_and_distinct() {
    let ids: HashSet<String> = (0..1_000).map(|_| generate_id()).collect();
    assert_eq!(ids.len(), 1_000);
    for id in &ids {
        assert!(is_valid_id(id));
        assert!(id.bytes().all(|byte| ID_ALPHABET.contains(&byte)));
    }
}
