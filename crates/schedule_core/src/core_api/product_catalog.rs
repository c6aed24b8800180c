// Static game data used by product generation. Pulled from the game's known
// property effects, mixable ingredients, and a pool of plausible product
// names handed out before falling back to numbered suffixes.

pub const PROPERTY_POOL: [&str; 34] = [
    "athletic",
    "balding",
    "gingeritis",
    "spicy",
    "jennerising",
    "thoughtprovoking",
    "tropicthunder",
    "giraffying",
    "longfaced",
    "sedating",
    "smelly",
    "paranoia",
    "laxative",
    "caloriedense",
    "energizing",
    "calming",
    "brighteyed",
    "foggy",
    "glowing",
    "antigravity",
    "slippery",
    "munchies",
    "explosive",
    "refreshing",
    "shrinking",
    "euphoric",
    "disorienting",
    "toxic",
    "zombifying",
    "cyclopean",
    "seizureinducing",
    "focused",
    "electrifying",
    "sneaky",
];

pub const MIX_INGREDIENTS: [&str; 16] = [
    "flumedicine",
    "gasoline",
    "mouthwash",
    "horsesemen",
    "iodine",
    "chili",
    "paracetamol",
    "energydrink",
    "donut",
    "banana",
    "viagra",
    "cuke",
    "motoroil",
    "addy",
    "megabean",
    "battery",
];

pub const PRODUCT_NAME_POOL: [&str; 130] = [
    "Abacavir",
    "Acetaminophen",
    "Acetazolamide",
    "Aciclovir",
    "Adalimumab",
    "Adenosine",
    "Adrenaline",
    "Albendazole",
    "Albuterol",
    "Allopurinol",
    "Amlodipine",
    "Amoxicillin",
    "Amphotericin B",
    "Aspirin",
    "Atorvastatin",
    "Atropine",
    "Azithromycin",
    "Baclofen",
    "Beclomethasone",
    "Benzocaine",
    "Betamethasone",
    "Bupropion",
    "Buspirone",
    "Caffeine",
    "Calcitriol",
    "Captopril",
    "Carbamazepine",
    "Cefalexin",
    "Ceftriaxone",
    "Celecoxib",
    "Cetirizine",
    "Chlorphenamine",
    "Ciprofloxacin",
    "Citalopram",
    "Clarithromycin",
    "Clonazepam",
    "Clopidogrel",
    "Codeine",
    "Cyclophosphamide",
    "Dexamethasone",
    "Diazepam",
    "Diclofenac",
    "Digoxin",
    "Diltiazem",
    "Diphenhydramine",
    "Doxycycline",
    "Enalapril",
    "Erythromycin",
    "Escitalopram",
    "Esomeprazole",
    "Ezetimibe",
    "Famotidine",
    "Fentanyl",
    "Ferrous Sulfate",
    "Fluconazole",
    "Fluoxetine",
    "Fluticasone",
    "Folic Acid",
    "Furosemide",
    "Gabapentin",
    "Gliclazide",
    "Heparin",
    "Hydrochlorothiazide",
    "Hydrocortisone",
    "Ibuprofen",
    "Imatinib",
    "Insulin",
    "Ipratropium",
    "Irbesartan",
    "Isoniazid",
    "Ketamine",
    "Ketoconazole",
    "Labetalol",
    "Lamotrigine",
    "Lansoprazole",
    "Levetiracetam",
    "Levofloxacin",
    "Levothyroxine",
    "Lidocaine",
    "Lisinopril",
    "Loratadine",
    "Lorazepam",
    "Losartan",
    "Metformin",
    "Methotrexate",
    "Methylprednisolone",
    "Metoprolol",
    "Metronidazole",
    "Mirtazapine",
    "Montelukast",
    "Morphine",
    "Naproxen",
    "Nifedipine",
    "Nitroglycerin",
    "Omeprazole",
    "Ondansetron",
    "Oxycodone",
    "Pantoprazole",
    "Paracetamol",
    "Paroxetine",
    "Penicillin",
    "Phenytoin",
    "Prazosin",
    "Prednisolone",
    "Pregabalin",
    "Propranolol",
    "Quetiapine",
    "Rabeprazole",
    "Ramipril",
    "Ranitidine",
    "Risperidone",
    "Rosuvastatin",
    "Salbutamol",
    "Sertraline",
    "Sildenafil",
    "Simvastatin",
    "Sodium Valproate",
    "Spironolactone",
    "Sumatriptan",
    "Tacrolimus",
    "Tadalafil",
    "Tamoxifen",
    "Tamsulosin",
    "Terbinafine",
    "Testosterone",
    "Tetracycline",
    "Thiamine",
    "Tiotropium",
    "Topiramate",
    "Tramadol",
];
