/// Offset y primo de FNV-1a de 32 bits.
const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Hash estable de una clave intermedia: FNV-1a (32 bits) enmascarado a positivo.
///
/// Tiene que dar el mismo valor en todos los procesos del job: el mapper y el
/// reducer lo usan por separado para ponerse de acuerdo en el bucket.
pub fn ihash(key: &str) -> u32 {
    let mut h = FNV32_OFFSET_BASIS;
    for byte in key.as_bytes() {
        h ^= u32::from(*byte);
        h = h.wrapping_mul(FNV32_PRIME);
    }
    h & 0x7fff_ffff
}

/// Bucket de reduce (en `[0, n_reduce)`) al que va una clave.
pub fn bucket(key: &str, n_reduce: u32) -> u32 {
    assert!(n_reduce > 0, "n_reduce tiene que ser > 0");
    ihash(key) % n_reduce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ihash_coincide_con_vectores_fnv1a() {
        // FNV-1a 32: "" -> 0x811c9dc5, "a" -> 0xe40c292c (ambos enmascarados)
        assert_eq!(ihash(""), 0x811c_9dc5 & 0x7fff_ffff);
        assert_eq!(ihash("a"), 0xe40c_292c & 0x7fff_ffff);
        assert_eq!(ihash("foobar"), 0xbf9c_f968 & 0x7fff_ffff);
    }

    #[test]
    fn bucket_retorna_id_en_rango() {
        for n in [1, 2, 3, 10, 97] {
            for key in ["a", "b", "c", "xyz", "otro", "", "ñandú"] {
                assert!(bucket(key, n) < n);
            }
        }
    }

    #[test]
    fn bucket_es_estable_entre_llamadas() {
        let first: Vec<u32> = ["alpha", "beta", "gamma"].iter().map(|k| bucket(k, 7)).collect();
        for _ in 0..10 {
            let again: Vec<u32> = ["alpha", "beta", "gamma"].iter().map(|k| bucket(k, 7)).collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn bucket_con_un_solo_reduce_siempre_es_cero() {
        assert_eq!(bucket("cualquier", 1), 0);
        assert_eq!(bucket("", 1), 0);
    }

    #[test]
    #[should_panic]
    fn bucket_con_cero_reduces_es_un_error() {
        bucket("a", 0);
    }
}
