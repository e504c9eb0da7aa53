use igloo_connector_dynamodb::split::numeric::{min_positive_value, split_points, NumericSettings};
use igloo_connector_dynamodb::{
    ComparisonOperator, KeyDecimal, KeyField, KeyType, QuerySplit, Radix, Settings, SplitRequest,
    Splitter, TypedValue,
};
use proptest::prelude::*;

fn interpolate(kind: KeyType, min: TypedValue, max: TypedValue, parallelism: i64) -> SplitRequest {
    SplitRequest::new(KeyField::new("pk", KeyType::String))
        .with_hash_key_value(TypedValue::string("tenant-1"))
        .unwrap()
        .with_range_key(KeyField::new("sk", kind))
        .with_interpolation(Some(min), Some(max))
        .unwrap()
        .with_parallelism(parallelism)
}

fn split(request: &SplitRequest) -> Vec<QuerySplit> {
    Splitter::default().split(request).unwrap()
}

#[test]
fn scenario_a_no_hash_key_no_range() {
    let settings = Settings::from_toml_str(
        r#"
        table_name = "t"
        [hash_key]
        name = "id"
        type = "N"
        "#,
    )
    .unwrap();
    let splits = split(&settings.split_request().unwrap());
    assert_eq!(splits.len(), 1);
    assert!(!splits[0].has_hash_key());
    assert!(!splits[0].has_range_key());
}

#[test]
fn scenario_b_explicit_condition() {
    let settings = Settings::from_toml_str(
        r#"
        table_name = "t"
        [hash_key]
        name = "id"
        type = "N"
        value = "007"
        [range_key]
        name = "rank"
        type = "N"
        operator = "GT"
        values = ["005"]
        "#,
    )
    .unwrap();
    let splits = split(&settings.split_request().unwrap());
    assert_eq!(splits.len(), 1);
    let only = &splits[0];
    assert!(only.has_range_key());
    assert_eq!(only.range_key_operator(), ComparisonOperator::Gt);
    assert_eq!(only.range_key_values(), &[TypedValue::N("005".into())]);
    assert_eq!(only.hash_key_value(), Some(&TypedValue::N("007".into())));
}

#[test]
fn scenario_c_numeric_interpolation() {
    let request = interpolate(KeyType::Number, TypedValue::N("0.0".into()), TypedValue::N("100.0".into()), 2);
    let splits = split(&request);
    assert_eq!(splits.len(), 2);
    assert!(splits.iter().all(|s| s.range_key_operator() == ComparisonOperator::Between));

    let first_upper: KeyDecimal = splits[0].range_key_values()[1].as_number().unwrap().parse().unwrap();
    let second_lower: KeyDecimal = splits[1].range_key_values()[0].as_number().unwrap().parse().unwrap();
    assert_eq!(second_lower, &first_upper + &min_positive_value());
    assert_eq!(splits[0].range_key_values()[0], TypedValue::N("0.0".into()));
    assert_eq!(splits[1].range_key_values()[1], TypedValue::N("100.0".into()));
}

#[test]
fn scenario_d_string_interpolation() {
    let request = interpolate(KeyType::String, TypedValue::string("AA"), TypedValue::string("BZ"), 2);
    let splits = split(&request);
    assert_eq!(splits.len(), 2);
    assert!(splits.iter().all(|s| s.range_key_operator() == ComparisonOperator::Between));

    let bounds: Vec<&str> = splits
        .iter()
        .flat_map(|s| s.range_key_values().iter().map(|v| v.as_str().unwrap()))
        .collect();
    assert_eq!(bounds.first(), Some(&"AA"));
    assert_eq!(bounds.last(), Some(&"BZ"));
    assert!(bounds.windows(2).all(|w| w[0] < w[1]), "{bounds:?}");
}

#[test]
fn scenario_e_interpolation_without_hash_key() {
    let request = SplitRequest::new(KeyField::new("pk", KeyType::String))
        .with_range_key(KeyField::new("sk", KeyType::Number))
        .with_interpolation(Some(TypedValue::N("0".into())), Some(TypedValue::N("10".into())))
        .unwrap()
        .with_parallelism(4);
    assert!(split(&request).is_empty());
}

#[test]
fn degenerate_count_matches_one() {
    for parallelism in [1, 0, -4] {
        let request = interpolate(KeyType::Number, TypedValue::N("1".into()), TypedValue::N("9".into()), parallelism);
        let splits = split(&request);
        assert_eq!(splits.len(), 1);
        assert!(!splits[0].has_range_key());
    }

    let points = split_points(1, &KeyDecimal::from_u64(1), &KeyDecimal::from_u64(9), &NumericSettings::default());
    assert_eq!(points.unwrap().len(), 2);
}

#[test]
fn single_point_interval_is_one_split() {
    let request = interpolate(KeyType::Number, TypedValue::N("5".into()), TypedValue::N("5".into()), 8);
    let splits = split(&request);
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].range_key_values(), &[TypedValue::N("5".into()), TypedValue::N("5".into())]);
}

fn assert_contiguous<T: PartialOrd + std::fmt::Debug>(
    ranges: &[(T, T)],
    min: &T,
    max: &T,
    successor: impl Fn(&T) -> T,
) {
    assert!(!ranges.is_empty());
    assert_eq!(&ranges[0].0, min);
    assert_eq!(&ranges[ranges.len() - 1].1, max);
    for (start, end) in ranges {
        assert!(start <= end, "{start:?} > {end:?}");
    }
    for pair in ranges.windows(2) {
        assert_eq!(pair[1].0, successor(&pair[0].1));
    }
}

proptest! {
    #[test]
    fn numeric_ranges_cover_interval(
        lo in -1_000_000i64..1_000_000,
        span in 0i64..1_000_000,
        scale in 0u32..4,
        parallelism in 2i64..40,
    ) {
        let min = KeyDecimal::new(lo, scale);
        let max = KeyDecimal::new(lo + span, scale);
        let request = interpolate(
            KeyType::Number,
            TypedValue::N(min.to_string()),
            TypedValue::N(max.to_string()),
            parallelism,
        );
        let ranges: Vec<(KeyDecimal, KeyDecimal)> = split(&request)
            .iter()
            .map(|s| {
                let v = s.range_key_values();
                (v[0].as_number().unwrap().parse().unwrap(), v[1].as_number().unwrap().parse().unwrap())
            })
            .collect();
        prop_assert!(ranges.len() as i64 <= parallelism);
        assert_contiguous(&ranges, &min, &max, |end| end + &min_positive_value());
    }

    #[test]
    fn text_ranges_cover_interval(
        a in "[ -~]{0,10}",
        b in "[ -~]{0,10}",
        parallelism in 2i64..20,
    ) {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        let request = interpolate(KeyType::String, TypedValue::string(&min), TypedValue::string(&max), parallelism);
        let ranges: Vec<(String, String)> = split(&request)
            .iter()
            .map(|s| {
                let v = s.range_key_values();
                (v[0].as_str().unwrap().to_string(), v[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_contiguous(&ranges, &min, &max, |end| format!("{end}\0"));
    }

    #[test]
    fn binary_ranges_cover_interval(
        a in proptest::collection::vec(any::<u8>(), 1..12),
        b in proptest::collection::vec(any::<u8>(), 1..12),
        parallelism in 2i64..20,
    ) {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        let request = interpolate(
            KeyType::Binary,
            TypedValue::binary(min.clone()),
            TypedValue::binary(max.clone()),
            parallelism,
        );
        let ranges: Vec<(Vec<u8>, Vec<u8>)> = split(&request)
            .iter()
            .map(|s| {
                let v = s.range_key_values();
                (v[0].as_bytes().unwrap().to_vec(), v[1].as_bytes().unwrap().to_vec())
            })
            .collect();
        assert_contiguous(&ranges, &min, &max, |end| {
            let mut next = end.clone();
            next.push(0);
            next
        });
    }

    #[test]
    fn ascii_round_trips_through_text_radix(s in "[!-~]{0,8}") {
        let symbols: Vec<u32> = s.chars().map(u32::from).collect();
        let encoded = Radix::TEXT.encode(&symbols).unwrap();
        let decoded: String = Radix::TEXT.decode(&encoded).unwrap().into_iter().filter_map(char::from_u32).collect();
        prop_assert_eq!(decoded, s);
    }

    #[test]
    fn splits_survive_the_wire(
        hash in proptest::option::of("[a-z0-9]{1,12}"),
        lo in "[a-z]{1,6}",
        hi in "[a-z]{1,6}",
        with_range in any::<bool>(),
    ) {
        let values = if with_range { vec![TypedValue::string(lo), TypedValue::string(hi)] } else { Vec::new() };
        let split = QuerySplit::new(
            &KeyField::new("pk", KeyType::String),
            hash.map(TypedValue::string),
            &KeyField::new("sk", KeyType::String),
            ComparisonOperator::Between,
            values,
        );
        let decoded = QuerySplit::from_bytes(&split.to_bytes().unwrap()).unwrap();
        prop_assert_eq!(decoded, split);
    }
}
