mod common;

use common::{engine, seed_user, text, user_ref};
use fieldcrypt_engine::{reconcile, Direction, InMemoryUnitOfWork, Interceptor};
use proptest::prelude::*;

proptest! {
    #[test]
    fn loaded_objects_flush_without_writes(
        email in "[\\p{L}\\p{N}@. -]{0,40}",
        iban in "[A-Z0-9]{0,24}",
        relational in any::<bool>(),
    ) {
        let i = if relational {
            Interceptor::relational(engine(), Direction::Both)
        } else {
            Interceptor::document(engine(), Direction::Both)
        };
        let mut uow = InMemoryUnitOfWork::new();
        seed_user(&mut uow, 1, "Ada", &email, &iban);
        let id = uow.load(user_ref(1), &i).unwrap().unwrap();

        uow.flush(&i).unwrap();
        uow.flush(&i).unwrap();

        prop_assert!(uow.writes().is_empty());
        prop_assert_eq!(text(&uow, id, "email"), email);
        prop_assert_eq!(text(&uow, id, "iban"), iban);
    }

    #[test]
    fn reconcile_twice_rewrites_nothing_the_second_time(email in "[\\p{L}\\p{N}@. -]{0,40}") {
        let i = Interceptor::relational(engine(), Direction::Decrypt);
        let mut uow = InMemoryUnitOfWork::new();
        seed_user(&mut uow, 1, "Ada", &email, "NO93");
        uow.load(user_ref(1), &i).unwrap();

        reconcile(i.engine(), &mut uow).unwrap();
        prop_assert_eq!(reconcile(i.engine(), &mut uow).unwrap(), 0);
    }
}
