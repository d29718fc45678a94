//! A small hand-maintained slice of the JDK.
//!
//! Enough of `java.lang`, `java.io`, `java.util` and `java.util.function` for
//! resolution of everyday method bodies. Members are written in a compact
//! Java-like notation and parsed once when the store is built.

use crate::{
    ClassKind, FieldDef, MethodDef, ParamDef, PrimitiveType, Type, TypeOrigin, TypeParamDef,
    TypeStore, WildcardBound,
};

struct JdkClass {
    /// Dotted name; nested classes use `$` (`java.util.Map$Entry`).
    name: &'static str,
    kind: ClassKind,
    params: &'static [&'static str],
    extends: Option<&'static str>,
    implements: &'static [&'static str],
    /// `static int MAX_VALUE`, `int length()`, `<init>(int)`, `static <T> T f(T)`.
    members: &'static [&'static str],
}

const fn class(
    name: &'static str,
    params: &'static [&'static str],
    extends: Option<&'static str>,
    implements: &'static [&'static str],
    members: &'static [&'static str],
) -> JdkClass {
    JdkClass {
        name,
        kind: ClassKind::Class,
        params,
        extends,
        implements,
        members,
    }
}

const fn interface(
    name: &'static str,
    params: &'static [&'static str],
    implements: &'static [&'static str],
    members: &'static [&'static str],
) -> JdkClass {
    JdkClass {
        name,
        kind: ClassKind::Interface,
        params,
        extends: None,
        implements,
        members,
    }
}

const fn annotation(name: &'static str, members: &'static [&'static str]) -> JdkClass {
    JdkClass {
        name,
        kind: ClassKind::Annotation,
        params: &[],
        extends: None,
        implements: &["java.lang.annotation.Annotation"],
        members,
    }
}

const BOXED_MEMBERS: &[&str] = &["static int hashCode(Object)"];

const JDK: &[JdkClass] = &[
    class(
        "java.lang.Object",
        &[],
        None,
        &[],
        &[
            "<init>()",
            "boolean equals(Object)",
            "int hashCode()",
            "String toString()",
            "Class<?> getClass()",
            "void notify()",
            "void notifyAll()",
            "void wait()",
        ],
    ),
    interface("java.lang.CharSequence", &[], &[], &["int length()", "char charAt(int)"]),
    interface("java.lang.Comparable", &["T"], &[], &["int compareTo(T)"]),
    interface("java.lang.Iterable", &["T"], &[], &["java.util.Iterator<T> iterator()"]),
    interface("java.lang.Runnable", &[], &[], &["void run()"]),
    interface("java.lang.AutoCloseable", &[], &[], &["void close()"]),
    interface("java.lang.Cloneable", &[], &[], &[]),
    interface("java.lang.annotation.Annotation", &[], &[], &[]),
    class(
        "java.lang.String",
        &[],
        Some("Object"),
        &["CharSequence", "Comparable<String>", "java.io.Serializable"],
        &[
            "<init>()",
            "<init>(String)",
            "<init>(char[])",
            "int length()",
            "char charAt(int)",
            "boolean isEmpty()",
            "String substring(int)",
            "String substring(int,int)",
            "int indexOf(String)",
            "int indexOf(int)",
            "boolean startsWith(String)",
            "boolean endsWith(String)",
            "boolean contains(CharSequence)",
            "String trim()",
            "String toUpperCase()",
            "String toLowerCase()",
            "String[] split(String)",
            "char[] toCharArray()",
            "boolean equalsIgnoreCase(String)",
            "int compareTo(String)",
            "String replace(CharSequence,CharSequence)",
            "static String valueOf(Object)",
            "static String valueOf(int)",
            "static String format(String,Object...)",
            "static String join(CharSequence,CharSequence...)",
        ],
    ),
    class(
        "java.lang.StringBuilder",
        &[],
        Some("Object"),
        &["CharSequence"],
        &[
            "<init>()",
            "<init>(String)",
            "StringBuilder append(String)",
            "StringBuilder append(Object)",
            "StringBuilder append(int)",
            "StringBuilder append(char)",
            "StringBuilder insert(int,String)",
            "StringBuilder reverse()",
            "int length()",
            "char charAt(int)",
            "String toString()",
        ],
    ),
    class(
        "java.lang.Class",
        &["T"],
        Some("Object"),
        &[],
        &[
            "String getName()",
            "String getSimpleName()",
            "boolean isInstance(Object)",
            "T cast(Object)",
        ],
    ),
    class(
        "java.lang.Enum",
        &["E"],
        Some("Object"),
        &["Comparable<E>", "java.io.Serializable"],
        &["String name()", "int ordinal()", "int compareTo(E)"],
    ),
    class("java.lang.Number", &[], Some("Object"), &["java.io.Serializable"], &[
        "int intValue()",
        "long longValue()",
        "float floatValue()",
        "double doubleValue()",
    ]),
    class("java.lang.Integer", &[], Some("Number"), &["Comparable<Integer>"], &[
        "<init>(int)",
        "static int MAX_VALUE",
        "static int MIN_VALUE",
        "static int parseInt(String)",
        "static Integer valueOf(int)",
        "static String toString(int)",
        "static int compare(int,int)",
        "static int hashCode(int)",
    ]),
    class("java.lang.Long", &[], Some("Number"), &["Comparable<Long>"], &[
        "static long MAX_VALUE",
        "static long MIN_VALUE",
        "static long parseLong(String)",
        "static Long valueOf(long)",
    ]),
    class("java.lang.Short", &[], Some("Number"), &["Comparable<Short>"], BOXED_MEMBERS),
    class("java.lang.Byte", &[], Some("Number"), &["Comparable<Byte>"], BOXED_MEMBERS),
    class("java.lang.Float", &[], Some("Number"), &["Comparable<Float>"], &[
        "static float parseFloat(String)",
    ]),
    class("java.lang.Double", &[], Some("Number"), &["Comparable<Double>"], &[
        "static double parseDouble(String)",
        "static Double valueOf(double)",
        "static boolean isNaN(double)",
    ]),
    class("java.lang.Character", &[], Some("Object"), &["Comparable<Character>"], &[
        "static boolean isDigit(char)",
        "static boolean isLetter(char)",
        "static boolean isWhitespace(char)",
        "static char toUpperCase(char)",
        "char charValue()",
    ]),
    class("java.lang.Boolean", &[], Some("Object"), &["Comparable<Boolean>"], &[
        "static Boolean TRUE",
        "static Boolean FALSE",
        "static boolean parseBoolean(String)",
        "boolean booleanValue()",
    ]),
    class("java.lang.Void", &[], Some("Object"), &[], &[]),
    class("java.lang.Math", &[], Some("Object"), &[], &[
        "static double PI",
        "static double E",
        "static int abs(int)",
        "static int max(int,int)",
        "static int min(int,int)",
        "static double sqrt(double)",
        "static double pow(double,double)",
        "static double random()",
        "static long round(double)",
        "static double floor(double)",
        "static double ceil(double)",
    ]),
    class("java.lang.System", &[], Some("Object"), &[], &[
        "static java.io.PrintStream out",
        "static java.io.PrintStream err",
        "static long currentTimeMillis()",
        "static long nanoTime()",
        "static void exit(int)",
        "static String getProperty(String)",
        "static void arraycopy(Object,int,Object,int,int)",
    ]),
    class("java.lang.Thread", &[], Some("Object"), &["Runnable"], &[
        "<init>()",
        "<init>(Runnable)",
        "void start()",
        "void run()",
        "void join()",
        "void interrupt()",
        "static Thread currentThread()",
        "static void sleep(long)",
    ]),
    class("java.lang.Throwable", &[], Some("Object"), &["java.io.Serializable"], &[
        "<init>()",
        "<init>(String)",
        "<init>(String,Throwable)",
        "String getMessage()",
        "Throwable getCause()",
        "void printStackTrace()",
    ]),
    class("java.lang.Exception", &[], Some("Throwable"), &[], &[
        "<init>()",
        "<init>(String)",
        "<init>(String,Throwable)",
    ]),
    class("java.lang.Error", &[], Some("Throwable"), &[], &["<init>()", "<init>(String)"]),
    class("java.lang.RuntimeException", &[], Some("Exception"), &[], &[
        "<init>()",
        "<init>(String)",
        "<init>(String,Throwable)",
    ]),
    class("java.lang.IllegalArgumentException", &[], Some("RuntimeException"), &[], &[
        "<init>()",
        "<init>(String)",
    ]),
    class("java.lang.IllegalStateException", &[], Some("RuntimeException"), &[], &[
        "<init>()",
        "<init>(String)",
    ]),
    class("java.lang.NullPointerException", &[], Some("RuntimeException"), &[], &[
        "<init>()",
        "<init>(String)",
    ]),
    class("java.lang.UnsupportedOperationException", &[], Some("RuntimeException"), &[], &[
        "<init>()",
        "<init>(String)",
    ]),
    class("java.lang.IndexOutOfBoundsException", &[], Some("RuntimeException"), &[], &[
        "<init>()",
        "<init>(String)",
    ]),
    class("java.lang.InterruptedException", &[], Some("Exception"), &[], &["<init>()"]),
    annotation("java.lang.Override", &[]),
    annotation("java.lang.Deprecated", &[]),
    annotation("java.lang.FunctionalInterface", &[]),
    annotation("java.lang.SuppressWarnings", &["String[] value()"]),
    interface("java.io.Serializable", &[], &[], &[]),
    interface("java.io.Closeable", &[], &["AutoCloseable"], &["void close()"]),
    class("java.io.PrintStream", &[], Some("Object"), &["java.io.Closeable"], &[
        "void println()",
        "void println(String)",
        "void println(Object)",
        "void println(int)",
        "void println(long)",
        "void println(double)",
        "void println(char)",
        "void println(boolean)",
        "void print(String)",
        "void print(Object)",
        "void print(int)",
        "java.io.PrintStream printf(String,Object...)",
        "void flush()",
    ]),
    class("java.io.IOException", &[], Some("Exception"), &[], &["<init>()", "<init>(String)"]),
    interface("java.util.Iterator", &["E"], &[], &["boolean hasNext()", "E next()", "void remove()"]),
    interface("java.util.Collection", &["E"], &["Iterable<E>"], &[
        "int size()",
        "boolean isEmpty()",
        "boolean contains(Object)",
        "boolean add(E)",
        "boolean remove(Object)",
        "boolean addAll(java.util.Collection<? extends E>)",
        "void clear()",
        "Object[] toArray()",
        "java.util.stream.Stream<E> stream()",
    ]),
    interface("java.util.List", &["E"], &["java.util.Collection<E>"], &[
        "E get(int)",
        "E set(int,E)",
        "void add(int,E)",
        "E remove(int)",
        "int indexOf(Object)",
        "java.util.List<E> subList(int,int)",
        "static <T> java.util.List<T> of(T...)",
    ]),
    interface("java.util.Set", &["E"], &["java.util.Collection<E>"], &[
        "static <T> java.util.Set<T> of(T...)",
    ]),
    interface("java.util.Queue", &["E"], &["java.util.Collection<E>"], &[
        "boolean offer(E)",
        "E poll()",
        "E peek()",
    ]),
    interface("java.util.Deque", &["E"], &["java.util.Queue<E>"], &[
        "void push(E)",
        "E pop()",
        "void addFirst(E)",
        "void addLast(E)",
    ]),
    interface("java.util.Map", &["K", "V"], &[], &[
        "int size()",
        "boolean isEmpty()",
        "V get(Object)",
        "V put(K,V)",
        "V remove(Object)",
        "V getOrDefault(Object,V)",
        "boolean containsKey(Object)",
        "boolean containsValue(Object)",
        "java.util.Set<K> keySet()",
        "java.util.Collection<V> values()",
        "java.util.Set<java.util.Map$Entry<K,V>> entrySet()",
        "void clear()",
    ]),
    interface("java.util.Map$Entry", &["K", "V"], &[], &["K getKey()", "V getValue()", "V setValue(V)"]),
    class("java.util.AbstractList", &["E"], Some("Object"), &["java.util.List<E>"], &[]),
    class("java.util.ArrayList", &["E"], Some("java.util.AbstractList<E>"), &["java.util.List<E>", "java.io.Serializable"], &[
        "<init>()",
        "<init>(int)",
        "<init>(java.util.Collection<? extends E>)",
        "void ensureCapacity(int)",
    ]),
    class("java.util.LinkedList", &["E"], Some("java.util.AbstractList<E>"), &["java.util.List<E>", "java.util.Deque<E>"], &[
        "<init>()",
    ]),
    class("java.util.HashMap", &["K", "V"], Some("Object"), &["java.util.Map<K,V>", "java.io.Serializable"], &[
        "<init>()",
        "<init>(int)",
    ]),
    class("java.util.TreeMap", &["K", "V"], Some("Object"), &["java.util.Map<K,V>"], &["<init>()"]),
    class("java.util.HashSet", &["E"], Some("Object"), &["java.util.Set<E>"], &["<init>()", "<init>(int)"]),
    class("java.util.ArrayDeque", &["E"], Some("Object"), &["java.util.Deque<E>"], &["<init>()"]),
    class("java.util.Objects", &[], Some("Object"), &[], &[
        "static boolean equals(Object,Object)",
        "static int hash(Object...)",
        "static boolean isNull(Object)",
        "static <T> T requireNonNull(T)",
        "static String toString(Object)",
    ]),
    class("java.util.Arrays", &[], Some("Object"), &[], &[
        "static <T> java.util.List<T> asList(T...)",
        "static String toString(Object[])",
        "static void sort(int[])",
        "static void fill(int[],int)",
    ]),
    class("java.util.Collections", &[], Some("Object"), &[], &[
        "static <T> java.util.List<T> emptyList()",
        "static <T> java.util.List<T> unmodifiableList(java.util.List<? extends T>)",
        "static void sort(java.util.List<?>)",
    ]),
    class("java.util.Optional", &["T"], Some("Object"), &[], &[
        "boolean isPresent()",
        "T get()",
        "T orElse(T)",
        "static <U> java.util.Optional<U> of(U)",
        "static <U> java.util.Optional<U> empty()",
    ]),
    interface("java.util.stream.Stream", &["T"], &[], &[
        "java.util.stream.Stream<T> filter(java.util.function.Predicate<? super T>)",
        "long count()",
    ]),
    interface("java.util.function.Function", &["T", "R"], &[], &["R apply(T)"]),
    interface("java.util.function.Supplier", &["T"], &[], &["T get()"]),
    interface("java.util.function.Consumer", &["T"], &[], &["void accept(T)"]),
    interface("java.util.function.Predicate", &["T"], &[], &["boolean test(T)"]),
    interface("java.util.function.BiFunction", &["T", "U", "R"], &[], &["R apply(T,U)"]),
];

impl TypeStore {
    /// A store pre-seeded with the small built-in JDK slice.
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore::new();

        // Skeletons first so member types can reference any class.
        let mut ids = Vec::with_capacity(JDK.len());
        for class in JDK {
            let (package, simple) = class.name.rsplit_once('.').unwrap_or(("", class.name));
            let (outer, name) = match simple.rsplit_once('$') {
                Some((outer, name)) => {
                    let outer_dotted = format!("{package}.{outer}");
                    (store.lookup_dotted(&outer_dotted), name)
                }
                None => (None, simple),
            };
            let id = store.intern_class(package, outer, name, class.kind, TypeOrigin::Builtin);
            if let Some(def) = store.class_mut(id) {
                def.modifiers = vec!["public".to_string()];
                def.type_params = class.params.iter().map(|p| TypeParamDef::new(*p)).collect();
            }
            ids.push(id);
        }

        for (class, id) in JDK.iter().zip(ids) {
            let super_class = class.extends.map(|name| parse_type(&mut store, name, class.params));
            let interfaces: Vec<Type> = class
                .implements
                .iter()
                .map(|name| parse_type(&mut store, name, class.params))
                .collect();
            let mut fields = Vec::new();
            let mut methods = Vec::new();
            let mut constructors = Vec::new();
            for spec in class.members {
                match parse_member(&mut store, spec, class.params) {
                    Member::Field(field) => fields.push(field),
                    Member::Method(method) => methods.push(method),
                    Member::Constructor(ctor) => constructors.push(ctor),
                }
            }
            if let Some(def) = store.class_mut(id) {
                def.super_class = super_class;
                def.interfaces = interfaces;
                def.fields = fields;
                def.methods = methods;
                def.constructors = constructors;
            }
        }
        store
    }
}

enum Member {
    Field(FieldDef),
    Method(MethodDef),
    Constructor(MethodDef),
}

fn parse_member(store: &mut TypeStore, spec: &str, class_params: &[&str]) -> Member {
    let mut rest = spec.trim();
    let is_static = match rest.strip_prefix("static ") {
        Some(tail) => {
            rest = tail;
            true
        }
        None => false,
    };

    let mut method_params: Vec<&str> = Vec::new();
    if let Some(tail) = rest.strip_prefix('<') {
        if let Some((params, tail)) = tail.split_once("> ") {
            method_params = params.split(',').map(str::trim).collect();
            rest = tail;
        }
    }
    let mut vars: Vec<&str> = class_params.to_vec();
    vars.extend(method_params.iter().copied());

    if let Some(args) = rest.strip_prefix("<init>(") {
        let (params, is_varargs) = parse_params(store, args.trim_end_matches(')'), &vars);
        let mut ctor = MethodDef::new("<init>", params, Type::Void);
        ctor.is_varargs = is_varargs;
        ctor.modifiers = vec!["public".to_string()];
        return Member::Constructor(ctor);
    }

    let (head, args) = match rest.split_once('(') {
        Some((head, args)) => (head, Some(args)),
        None => (rest, None),
    };
    // Return types are written without spaces.
    let (ret, name) = head.rsplit_once(' ').unwrap_or(("void", head));

    let return_type = parse_type(store, ret, &vars);
    match args {
        Some(args) => {
            let (params, is_varargs) = parse_params(store, args.trim_end_matches(')'), &vars);
            let mut method = MethodDef::new(name, params, return_type);
            method.type_params = method_params.iter().map(|p| TypeParamDef::new(*p)).collect();
            method.is_static = is_static;
            method.is_varargs = is_varargs;
            method.modifiers = if is_static {
                vec!["public".to_string(), "static".to_string()]
            } else {
                vec!["public".to_string()]
            };
            Member::Method(method)
        }
        None => {
            let mut field = FieldDef::new(name, return_type);
            field.is_static = is_static;
            field.modifiers = if is_static {
                vec!["public".to_string(), "static".to_string(), "final".to_string()]
            } else {
                vec!["public".to_string()]
            };
            Member::Field(field)
        }
    }
}

fn parse_params(store: &mut TypeStore, args: &str, vars: &[&str]) -> (Vec<ParamDef>, bool) {
    let mut is_varargs = false;
    let params = split_top_level(args)
        .into_iter()
        .enumerate()
        .map(|(idx, arg)| {
            let ty = match arg.strip_suffix("...") {
                Some(elem) => {
                    is_varargs = true;
                    Type::Array(Box::new(parse_type(store, elem, vars)))
                }
                None => parse_type(store, arg, vars),
            };
            ParamDef {
                name: format!("arg{idx}"),
                ty,
            }
        })
        .collect();
    (params, is_varargs)
}

fn split_top_level(list: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in list.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(list[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let last = list[start..].trim();
    if !last.is_empty() {
        out.push(last);
    }
    out
}

fn parse_type(store: &mut TypeStore, text: &str, vars: &[&str]) -> Type {
    let text = text.trim();
    if let Some(elem) = text.strip_suffix("[]") {
        return Type::Array(Box::new(parse_type(store, elem, vars)));
    }
    if text == "void" {
        return Type::Void;
    }
    if let Some(p) = PrimitiveType::from_name(text) {
        return Type::Primitive(p);
    }
    if text == "?" {
        return Type::Wildcard(WildcardBound::Unbounded);
    }
    if let Some(bound) = text.strip_prefix("? extends ") {
        return Type::Wildcard(WildcardBound::Extends(Box::new(parse_type(store, bound, vars))));
    }
    if let Some(bound) = text.strip_prefix("? super ") {
        return Type::Wildcard(WildcardBound::Super(Box::new(parse_type(store, bound, vars))));
    }

    let (name, args) = match text.find('<') {
        Some(open) => (&text[..open], Some(&text[open + 1..text.len() - 1])),
        None => (text, None),
    };
    if vars.contains(&name) {
        return Type::TypeVar(name.to_string());
    }
    let dotted = if name.contains('.') {
        name.replace('$', ".")
    } else {
        format!("java.lang.{name}")
    };
    let Some(id) = store.lookup_dotted(&dotted) else {
        return Type::Unknown(name.to_string());
    };
    match args {
        Some(args) => {
            let args = split_top_level(args)
                .into_iter()
                .map(|arg| parse_type(store, arg, vars))
                .collect();
            Type::Class(store.specialize(id, args))
        }
        None => Type::Class(id),
    }
}
