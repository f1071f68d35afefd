/// Implements FromSql for integer-backed enums
macro_rules! int_enum_from_sql {
    ($t:ty) => {
        impl<'a> postgres_types::FromSql<'a> for $t {
            fn from_sql(
                _: &postgres_types::Type,
                raw: &'a [u8],
            ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
                let int_value = postgres_protocol::types::int2_from_sql(raw)?;
                let value = Self::try_from(int_value)?;
                Ok(value)
            }

            fn accepts(ty: &postgres_types::Type) -> bool {
                matches!(*ty, postgres_types::Type::INT2)
            }
        }
    }
}

/// Implements ToSql for integer-backed enums
macro_rules! int_enum_to_sql {
    ($t:ty) => {
        impl postgres_types::ToSql for $t {
            fn to_sql(
                &self,
                ty: &postgres_types::Type,
                out: &mut bytes::BytesMut,
            ) -> Result<postgres_types::IsNull, Box<dyn std::error::Error + Sync + Send>> {
                let int_value = i16::from(self);
                postgres_types::ToSql::to_sql(&int_value, ty, out)
            }

            fn accepts(ty: &postgres_types::Type) -> bool {
                matches!(*ty, postgres_types::Type::INT2)
            }

            postgres_types::to_sql_checked!();
        }
    }
}

pub(crate) use {int_enum_from_sql, int_enum_to_sql};
