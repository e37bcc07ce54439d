pub mod row_set;

use crate::errors::*;

use std::collections::HashMap;

/// Ensure no name appears in more than one of the given sets.
pub fn check_disjoint<'a, I>(sets: &[(&str, I)]) -> Result<()>
    where I: Clone + IntoIterator<Item=&'a String> {
    let mut seen = HashMap::<&String, &str>::new();
    for (role, names) in sets {
        for name in names.clone() {
            if let Some(previous) = seen.insert(name, *role) {
                return Err(format!(
                    "attribute '{}' is assigned to more than one role: {} and {}",
                    name, previous, role).into());
            }
        }
    }
    Ok(())
}


#[cfg(test)]
mod test_utilities {
    use crate::utilities::check_disjoint;
    use indexmap::IndexSet;

    #[test]
    fn disjoint_sets() {
        let left = vec!["a".to_string(), "b".to_string()].into_iter().collect::<IndexSet<String>>();
        let right = vec!["c".to_string()].into_iter().collect::<IndexSet<String>>();
        let overlap = vec!["b".to_string()].into_iter().collect::<IndexSet<String>>();

        assert!(check_disjoint(&[("hot", &left), ("cold", &right)]).is_ok());
        let err = check_disjoint(&[("hot", &left), ("cold", &right), ("other", &overlap)]).unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }
}
