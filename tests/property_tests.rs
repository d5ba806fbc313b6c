use proptest::prelude::*;
use sovran_coerce::{builtin, CoercionEngine, ContainerType, DeepFind, Target, Value};
use std::collections::BTreeSet;

proptest! {
    #[test]
    fn coercion_is_idempotent(n in any::<i64>()) {
        let target = Target::integer();
        let once = CoercionEngine::coerce(Value::from(n.to_string()), Some(&target)).unwrap();
        let twice = CoercionEngine::coerce(once.clone(), Some(&target)).unwrap();
        prop_assert_eq!(&once, &Value::Int(n));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn key_rule_takes_precedence(name in "[a-z]{1,8}", n in any::<i32>()) {
        let kind = ContainerType::define("Precedence");
        kind.coerce_key(name.as_str(), Target::string())
            .coerce_value(&builtin::fixnum(), Target::float());

        let map = kind.instantiate();
        map.set(Value::sym(&name), n).unwrap();
        map.set(Value::from(format!("{name}_other")), n).unwrap();

        prop_assert_eq!(map.get(Value::sym(&name)).unwrap(), Value::from(n.to_string()));
        prop_assert_eq!(
            map.get(format!("{name}_other")).unwrap(),
            Value::Float(f64::from(n))
        );
    }

    #[test]
    fn set_targets_deduplicate(items in prop::collection::vec(0u8..16, 0..32)) {
        let target = Target::set(Target::integer());
        let input = Value::array(items.iter().map(|n| n.to_string()));
        let out = CoercionEngine::coerce(input, Some(&target)).unwrap();

        let distinct: BTreeSet<u8> = items.iter().copied().collect();
        let set = out.as_set().unwrap();
        prop_assert_eq!(set.len(), distinct.len());
        for n in distinct {
            prop_assert!(set.contains(&Value::Int(i64::from(n))));
        }
    }

    #[test]
    fn deep_find_all_reaches_every_level(depth in 1usize..8) {
        let key = Value::sym("k");
        let mut nested = Value::Int(0);
        for level in 1..=depth {
            nested = Value::map([
                (key.clone(), Value::Int(level as i64)),
                (Value::sym("child"), nested),
            ]);
        }

        let found = nested.deep_find_all(&key).unwrap();
        let expected: Vec<Value> = (1..=depth).rev().map(|l| Value::Int(l as i64)).collect();
        prop_assert_eq!(found, expected);
    }
}
